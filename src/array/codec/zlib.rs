//! The `zlib` compressor.
//!
//! Applies zlib (RFC 1950) compression.

use std::{
    io::{Cursor, Read},
    sync::Arc,
};

use flate2::bufread::{ZlibDecoder, ZlibEncoder};

use super::{parse_level_configuration, CodecError, CompressorTraits};

const IDENTIFIER: &str = "zlib";

const DEFAULT_LEVEL: u32 = 6;
const MAX_LEVEL: u32 = 9;

/// A `zlib` compressor implementation.
#[derive(Clone, Debug)]
pub struct ZlibCompressor {
    compression: flate2::Compression,
}

impl ZlibCompressor {
    /// Create a new `zlib` compressor.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `level` exceeds 9.
    pub fn new(level: u32) -> Result<Self, CodecError> {
        if level > MAX_LEVEL {
            return Err(CodecError::InvalidConfiguration {
                name: IDENTIFIER,
                reason: format!("level {level} exceeds maximum {MAX_LEVEL}"),
            });
        }
        Ok(Self {
            compression: flate2::Compression::new(level),
        })
    }
}

pub(super) fn create_compressor_zlib(
    compression_opts: &serde_json::Value,
) -> Result<Arc<dyn CompressorTraits>, CodecError> {
    let level =
        parse_level_configuration(IDENTIFIER, compression_opts, DEFAULT_LEVEL, MAX_LEVEL)?;
    Ok(Arc::new(ZlibCompressor::new(level)?))
}

impl CompressorTraits for ZlibCompressor {
    fn name(&self) -> &'static str {
        IDENTIFIER
    }

    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(Cursor::new(decoded), self.compression);
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded: Vec<u8>, decoded_size: usize) -> Result<Vec<u8>, CodecError> {
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded));
        let mut out: Vec<u8> = Vec::with_capacity(decoded_size);
        decoder.read_to_end(&mut out)?;
        if out.len() != decoded_size {
            return Err(CodecError::UnexpectedDecodedSize(out.len(), decoded_size));
        }
        Ok(out)
    }
}
