//! Zarr V2 compression codecs.
//!
//! A compressor encodes and decodes whole raw chunks. The stored chunk payload is exactly the
//! output of the compressor over the raw chunk bytes; no framing, length prefix, or checksum
//! is added by this crate. Decoders determine the output size from their own payload, and the
//! known raw chunk size is passed by the caller as a consistency check.
//!
//! Compressors are identified by name in a process-wide [registry](create_compressor). The
//! `zlib`, `gzip`, and `zstd` compressors are built in; additional compressors can be added at
//! startup with [`register_compressor`]. No compression (JSON null metadata) is represented by
//! the absence of a compressor, not a registry entry.
//!
//! Compressor configuration (`compression_opts` metadata) is opaque to this crate and is
//! validated by the named compressor when an array is opened or created.

mod gzip;
mod zlib;
mod zstd;

use std::{collections::HashMap, sync::Arc, sync::OnceLock};

use parking_lot::RwLock;
use thiserror::Error;

pub use gzip::GzipCompressor;
pub use zlib::ZlibCompressor;
pub use zstd::ZstdCompressor;

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An unsupported compressor.
    #[error("compressor {0} is not supported")]
    UnsupportedCompressor(String),
    /// An invalid compressor configuration.
    #[error("invalid configuration for compressor {name}: {reason}")]
    InvalidConfiguration {
        /// The compressor name.
        name: &'static str,
        /// Why the configuration is invalid.
        reason: String,
    },
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An unexpected decoded chunk size.
    #[error("decoded chunk has size {0}, expected {1}")]
    UnexpectedDecodedSize(usize, usize),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Compressor traits.
///
/// A compressor is a pure `bytes -> bytes` pair operating on whole chunks.
pub trait CompressorTraits: Send + Sync + core::fmt::Debug {
    /// Return the registered name of the compressor.
    fn name(&self) -> &'static str;

    /// Encode `decoded` chunk bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if encoding fails.
    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode `encoded` chunk bytes into `decoded_size` bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if decoding fails or the decoded size does not match
    /// `decoded_size`.
    fn decode(&self, encoded: Vec<u8>, decoded_size: usize) -> Result<Vec<u8>, CodecError>;
}

/// A function creating a compressor from its `compression_opts` configuration.
pub type CompressorCreateFn =
    fn(&serde_json::Value) -> Result<Arc<dyn CompressorTraits>, CodecError>;

fn registry() -> &'static RwLock<HashMap<String, CompressorCreateFn>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, CompressorCreateFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry: HashMap<String, CompressorCreateFn> = HashMap::new();
        registry.insert("zlib".to_string(), zlib::create_compressor_zlib);
        registry.insert("gzip".to_string(), gzip::create_compressor_gzip);
        registry.insert("zstd".to_string(), zstd::create_compressor_zstd);
        RwLock::new(registry)
    })
}

/// Register a compressor with `name`, replacing any existing registration.
///
/// Registration is intended to happen at process startup, before any arrays are opened.
pub fn register_compressor(name: &str, create_fn: CompressorCreateFn) {
    registry().write().insert(name.to_string(), create_fn);
}

/// Create the compressor registered with `name` from `compression_opts`.
///
/// # Errors
/// Returns [`CodecError::UnsupportedCompressor`] if `name` is not registered, or a
/// [`CodecError`] if the configuration is invalid for the compressor.
pub fn create_compressor(
    name: &str,
    compression_opts: &serde_json::Value,
) -> Result<Arc<dyn CompressorTraits>, CodecError> {
    let create_fn = *registry()
        .read()
        .get(name)
        .ok_or_else(|| CodecError::UnsupportedCompressor(name.to_string()))?;
    create_fn(compression_opts)
}

/// Parse a compression level configuration.
///
/// Accepted forms: JSON null (the `default` level), a bare integer, or an object containing
/// only a `level` member.
fn parse_level_configuration(
    name: &'static str,
    compression_opts: &serde_json::Value,
    default: u32,
    max: u32,
) -> Result<u32, CodecError> {
    let err = |reason: String| CodecError::InvalidConfiguration { name, reason };
    let level = match compression_opts {
        serde_json::Value::Null => return Ok(default),
        serde_json::Value::Number(level) => level.clone(),
        serde_json::Value::Object(object) => {
            if object.len() != 1 {
                return Err(err(compression_opts.to_string()));
            }
            match object.get("level") {
                Some(serde_json::Value::Number(level)) => level.clone(),
                _ => return Err(err(compression_opts.to_string())),
            }
        }
        _ => return Err(err(compression_opts.to_string())),
    };
    let level = level
        .as_u64()
        .and_then(|level| u32::try_from(level).ok())
        .ok_or_else(|| err(level.to_string()))?;
    if level > max {
        return Err(err(format!("level {level} exceeds maximum {max}")));
    }
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_create() {
        assert!(create_compressor("zlib", &serde_json::Value::Null).is_ok());
        assert!(create_compressor("gzip", &serde_json::json!(1)).is_ok());
        assert!(create_compressor("zstd", &serde_json::json!({"level": 3})).is_ok());
        assert!(matches!(
            create_compressor("blosc", &serde_json::Value::Null),
            Err(CodecError::UnsupportedCompressor(_))
        ));
    }

    #[test]
    fn configuration_invalid() {
        assert!(create_compressor("zlib", &serde_json::json!(10)).is_err());
        assert!(create_compressor("zlib", &serde_json::json!(-1)).is_err());
        assert!(create_compressor("zlib", &serde_json::json!("1")).is_err());
        assert!(create_compressor("zlib", &serde_json::json!({"levell": 1})).is_err());
        assert!(create_compressor("zstd", &serde_json::json!(23)).is_err());
    }

    #[test]
    fn round_trips() {
        let bytes: Vec<u8> = (0u8..255).cycle().take(10000).collect();
        for (name, compression_opts) in [
            ("zlib", serde_json::json!(1)),
            ("gzip", serde_json::json!({"level": 9})),
            ("zstd", serde_json::Value::Null),
        ] {
            let compressor = create_compressor(name, &compression_opts).unwrap();
            let encoded = compressor.encode(bytes.clone()).unwrap();
            assert_ne!(encoded, bytes);
            let decoded = compressor.decode(encoded, bytes.len()).unwrap();
            assert_eq!(decoded, bytes);
        }
    }

    #[test]
    fn decode_size_mismatch() {
        let compressor = create_compressor("zlib", &serde_json::Value::Null).unwrap();
        let encoded = compressor.encode(vec![0; 100]).unwrap();
        assert!(matches!(
            compressor.decode(encoded, 99),
            Err(CodecError::UnexpectedDecodedSize(100, 99))
        ));
    }
}
