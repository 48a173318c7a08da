pub mod chunk;
pub mod compression;
pub mod error;
pub mod gamma;
pub mod header;
pub mod linkgraph;
pub mod reader;
pub mod record;
pub mod savegame;

// Re-export main types
pub use chunk::{ChunkType, FieldDecl, FieldType, Headers};
pub use compression::CompressionType;
pub use error::SavegameError;
pub use header::SavegameHeader;
pub use linkgraph::{LinkGraph, LinkGraphError, LinkStat};
pub use record::{Record, Value};
pub use savegame::{parse_savegame, parse_savegame_with_chunk_size, Chunk, Savegame, DEFAULT_CHUNK_SIZE};
