/// Compression wrappers around the chunk stream
use std::io::{BufRead, Read};

use flate2::bufread::ZlibDecoder;
use xz2::bufread::XzDecoder;

use crate::error::SavegameError;

/// Compression format named by the first four bytes of a savegame.
///
/// The legacy lzo2 container (`OTTD`) is not supported: no release has
/// written it by default for a very long time, so it fails the same way
/// an unknown tag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Zlib,
    Lzma,
}

impl CompressionType {
    pub fn from_tag(tag: &[u8; 4]) -> Result<Self, SavegameError> {
        match tag {
            b"OTTN" => Ok(CompressionType::None),
            b"OTTZ" => Ok(CompressionType::Zlib),
            b"OTTX" => Ok(CompressionType::Lzma),
            _ => Err(SavegameError::UnknownCompression(
                String::from_utf8_lossy(tag).to_string(),
            )),
        }
    }

    /// Wrap the remainder of the outer stream in the matching
    /// decompressor. Decompressor state survives input chunk boundaries,
    /// so one compressed chunk may surface as several reads and the
    /// other way around.
    pub fn decompressor<R: BufRead>(self, inner: R) -> Decompressor<R> {
        match self {
            CompressionType::None => Decompressor::Plain(inner),
            CompressionType::Zlib => Decompressor::Zlib(ZlibDecoder::new(inner)),
            CompressionType::Lzma => Decompressor::Lzma(XzDecoder::new(inner)),
        }
    }
}

/// Streaming byte-stream-to-byte-stream adapter, one variant per
/// supported compression tag.
pub enum Decompressor<R> {
    Plain(R),
    Zlib(ZlibDecoder<R>),
    Lzma(XzDecoder<R>),
}

impl<R: BufRead> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Decompressor::Plain(inner) => inner.read(buf),
            Decompressor::Zlib(decoder) => decoder.read(buf),
            Decompressor::Lzma(decoder) => decoder.read(buf),
        }
    }
}
