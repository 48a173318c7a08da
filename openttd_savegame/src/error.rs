use thiserror::Error;

/// Everything that can go wrong while decoding a savegame. Any of these
/// aborts the decode; there is no partial result.
#[derive(Debug, Error)]
pub enum SavegameError {
    #[error("unknown savegame compression {0:?}")]
    UnknownCompression(String),
    #[error("unknown chunk type {0}")]
    UnknownChunkType(u8),
    #[error("invalid savegame")]
    InvalidSavegame,
    #[error("invalid gamma encoding")]
    InvalidGamma,
    #[error("unknown field type {0}")]
    UnknownFieldType(u8),
    #[error("table header declared {declared} bytes but {consumed} were read")]
    TableHeaderSizeMismatch { declared: u64, consumed: u64 },
    #[error("junk at the end of a record in chunk {0}")]
    TrailingJunkInChunk(String),
    #[error("junk at the end of file")]
    TrailingJunk,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
