//! A filesystem store.
//!
//! Each store key maps to a file below a base directory, so a hierarchy written through this
//! store is interoperable with other Zarr V2 implementations reading the same directory.

use parking_lot::RwLock;
use thiserror::Error;
use walkdir::WalkDir;

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    StoreKeyError, StoreKeys, StorePrefix, WritableStorageTraits,
};

/// A filesystem store.
#[derive(Debug)]
pub struct FilesystemStore {
    base_directory: PathBuf,
    readonly: bool,
    files: RwLock<HashMap<StoreKey, Mutex<()>>>,
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The base directory is not valid.
    #[error("base directory {0} is not valid")]
    InvalidBaseDirectory(PathBuf),
    /// The base directory points to an existing file.
    #[error("base directory {0} is an existing file")]
    ExistingFile(PathBuf),
}

impl FilesystemStore {
    /// Create a new filesystem store at a given `base_directory`.
    ///
    /// The base directory will be created if it does not exist.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_directory`:
    ///  - is not valid, or
    ///  - points to an existing file rather than a directory.
    pub fn new<P: AsRef<Path>>(
        base_directory: P,
    ) -> Result<FilesystemStore, FilesystemStoreCreateError> {
        let base_directory = base_directory.as_ref().to_path_buf();
        if base_directory.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBaseDirectory(
                base_directory,
            ));
        }
        if base_directory.is_file() {
            return Err(FilesystemStoreCreateError::ExistingFile(base_directory));
        }
        let readonly = if base_directory.is_dir() {
            let md = std::fs::metadata(&base_directory)?;
            md.permissions().readonly()
        } else {
            std::fs::create_dir_all(&base_directory)?;
            false
        };
        Ok(FilesystemStore {
            base_directory,
            readonly,
            files: RwLock::new(HashMap::new()),
        })
    }

    /// Maps a [`StoreKey`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        self.base_directory.join(key.as_str())
    }

    /// Maps a filesystem [`PathBuf`] to a [`StoreKey`].
    fn fspath_to_key(&self, path: &Path) -> Result<StoreKey, StoreKeyError> {
        let relative = pathdiff::diff_paths(path, &self.base_directory).ok_or_else(|| {
            StoreKeyError::from(path.to_str().unwrap_or_default().to_string())
        })?;
        let relative = relative
            .to_str()
            .ok_or_else(|| StoreKeyError::from(path.to_str().unwrap_or_default().to_string()))?
            .replace(std::path::MAIN_SEPARATOR, "/");
        StoreKey::new(relative)
    }

    fn key_lock<'a>(
        files: &'a mut HashMap<StoreKey, Mutex<()>>,
        key: &StoreKey,
    ) -> &'a Mutex<()> {
        files.entry(key.clone()).or_default()
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let mut files = self.files.write();
        let _lock = Self::key_lock(&mut files, key).lock();
        let mut file = match File::open(self.key_to_fspath(key)) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(Some(buffer))
    }

    fn contains(&self, key: &StoreKey) -> Result<bool, StorageError> {
        Ok(self.key_to_fspath(key).is_file())
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        let mut files = self.files.write();
        let _lock = Self::key_lock(&mut files, key).lock();
        let path = self.key_to_fspath(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(value)?;
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<bool, StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        let mut files = self.files.write();
        let _lock = Self::key_lock(&mut files, key).lock();
        match std::fs::remove_file(self.key_to_fspath(key)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        let dir = self.base_directory.join(prefix.as_str());
        match std::fs::remove_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let dir = self.base_directory.join(prefix.as_str());
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        let mut keys: StoreKeys = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|err| StorageError::Other(err.to_string()))?;
            if entry.file_type().is_file() {
                keys.push(self.fspath_to_key(entry.path())?);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn filesystem_set_get_erase() -> Result<(), Box<dyn Error>> {
        let path = tempfile::TempDir::new()?;
        let store = FilesystemStore::new(path.path())?;
        let key = "a/b".try_into()?;
        assert!(store.get(&key)?.is_none());
        store.set(&key, &[0, 1, 2])?;
        assert_eq!(store.get(&key)?.unwrap(), &[0, 1, 2]);
        assert!(store.contains(&key)?);
        assert!(store.erase(&key)?);
        assert!(!store.erase(&key)?);
        Ok(())
    }

    #[test]
    fn filesystem_list() -> Result<(), Box<dyn Error>> {
        let path = tempfile::TempDir::new()?;
        let store = FilesystemStore::new(path.path())?;
        store.set(&"a/b".try_into()?, &[])?;
        store.set(&"a/c".try_into()?, &[])?;
        store.set(&"a/d/e".try_into()?, &[])?;
        assert_eq!(
            store.list()?,
            &["a/b".try_into()?, "a/c".try_into()?, "a/d/e".try_into()?]
        );
        assert_eq!(
            store.list_prefix(&"a/d/".try_into()?)?,
            &["a/d/e".try_into()?]
        );
        store.erase_prefix(&"a/d/".try_into()?)?;
        assert_eq!(store.list()?, &["a/b".try_into()?, "a/c".try_into()?]);
        Ok(())
    }

    #[test]
    fn filesystem_existing_file() -> Result<(), Box<dyn Error>> {
        let tmpfile = tempfile::NamedTempFile::new()?;
        assert!(FilesystemStore::new(tmpfile.path()).is_err());
        Ok(())
    }
}
