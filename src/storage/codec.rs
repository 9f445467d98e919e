//! Compressor registry
//!
//! A closed set of compression codecs, each mapping to an encoder, a decoder,
//! and a file extension. Adding a codec means adding a variant here and
//! extending the match arms.

use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

use crate::ConfigError;

/// The compression codec used for persisted graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compressor {
    Gzip,
    Bz2,
    Xz,
}

impl Compressor {
    /// Resolves a compressor from its configuration identifier.
    pub fn from_id(id: &str) -> Result<Self, ConfigError> {
        match id {
            "gzip" => Ok(Self::Gzip),
            "bz2" => Ok(Self::Bz2),
            "xz" | "lzma" => Ok(Self::Xz),
            other => Err(ConfigError::UnknownCompressor(other.to_string())),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bz2 => "bz2",
            Self::Xz => "xz",
        }
    }

    /// The file extension produced by this codec, with the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => ".gz",
            Self::Bz2 => ".bz2",
            Self::Xz => ".xz",
        }
    }

    /// Compresses a payload into a fresh buffer.
    pub fn compress(&self, payload: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut enc =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(payload)?;
                enc.finish()
            }
            Self::Bz2 => {
                let mut enc =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                enc.write_all(payload)?;
                enc.finish()
            }
            Self::Xz => {
                let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
                enc.write_all(payload)?;
                enc.finish()
            }
        }
    }

    /// Decompresses a buffer produced by [`compress`](Self::compress).
    pub fn decompress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::Gzip => flate2::read::GzDecoder::new(bytes).read_to_end(&mut out)?,
            Self::Bz2 => bzip2::read::BzDecoder::new(bytes).read_to_end(&mut out)?,
            Self::Xz => xz2::read::XzDecoder::new(bytes).read_to_end(&mut out)?,
        };
        Ok(out)
    }
}
