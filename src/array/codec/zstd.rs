//! The `zstd` compressor.
//!
//! Applies [Zstandard](https://tools.ietf.org/html/rfc8878) compression.

use std::{io::Cursor, sync::Arc};

use super::{parse_level_configuration, CodecError, CompressorTraits};

const IDENTIFIER: &str = "zstd";

const DEFAULT_LEVEL: u32 = 0;
const MAX_LEVEL: u32 = 22;

/// A `zstd` compressor implementation.
#[derive(Clone, Debug)]
pub struct ZstdCompressor {
    compression: i32,
}

impl ZstdCompressor {
    /// Create a new `zstd` compressor.
    ///
    /// A `level` of 0 uses the zstd default compression level.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `level` exceeds 22.
    pub fn new(level: u32) -> Result<Self, CodecError> {
        if level > MAX_LEVEL {
            return Err(CodecError::InvalidConfiguration {
                name: IDENTIFIER,
                reason: format!("level {level} exceeds maximum {MAX_LEVEL}"),
            });
        }
        Ok(Self {
            compression: i32::try_from(level).unwrap_or(0),
        })
    }
}

pub(super) fn create_compressor_zstd(
    compression_opts: &serde_json::Value,
) -> Result<Arc<dyn CompressorTraits>, CodecError> {
    let level =
        parse_level_configuration(IDENTIFIER, compression_opts, DEFAULT_LEVEL, MAX_LEVEL)?;
    Ok(Arc::new(ZstdCompressor::new(level)?))
}

impl CompressorTraits for ZstdCompressor {
    fn name(&self) -> &'static str {
        IDENTIFIER
    }

    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(zstd::encode_all(Cursor::new(decoded), self.compression)?)
    }

    fn decode(&self, encoded: Vec<u8>, decoded_size: usize) -> Result<Vec<u8>, CodecError> {
        let out = zstd::decode_all(Cursor::new(encoded))?;
        if out.len() != decoded_size {
            return Err(CodecError::UnexpectedDecodedSize(out.len(), decoded_size));
        }
        Ok(out)
    }
}
