/// OpenTTD savegame decoder
use std::io::{BufReader, Read};

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::chunk::{self, ChunkType, Headers};
use crate::error::SavegameError;
use crate::header::SavegameHeader;
use crate::reader::{BinaryReader, ChunkSource};
use crate::record::{self, Record};

/// Default upper bound for the read-ahead buffer on the compressed
/// side of the stream. Does not change the decoded output.
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// Everything the decoder extracts from one savegame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Savegame {
    pub savegame_version: u16,
    pub chunks: IndexMap<String, Chunk>,
}

/// A decoded chunk: its header schemas and its records, both in
/// on-disk order. Chunks without an inline schema keep the single
/// `"unsupported"` header entry and no records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub headers: Headers,
    pub records: IndexMap<String, Record>,
}

impl Chunk {
    fn unsupported() -> Self {
        let mut headers = Headers::new();
        headers.insert("unsupported".to_string(), Vec::new());
        Self {
            headers,
            records: IndexMap::new(),
        }
    }
}

/// Decode a savegame from a lazy sequence of byte chunks of arbitrary
/// sizes. The input is pulled as needed; only the decoded output and
/// bounded transient buffers are held in memory.
pub fn parse_savegame<I>(chunks: I) -> Result<Savegame, SavegameError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    parse_savegame_with_chunk_size(chunks, DEFAULT_CHUNK_SIZE)
}

/// Like [`parse_savegame`], with an explicit bound on the intermediate
/// buffer between the raw input and the decompressor.
pub fn parse_savegame_with_chunk_size<I>(
    chunks: I,
    chunk_size: usize,
) -> Result<Savegame, SavegameError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut outer = BinaryReader::new(ChunkSource::new(chunks.into_iter()));
    let header = SavegameHeader::parse(&mut outer)?;
    debug!(
        "savegame version {}, compression {:?}",
        header.version, header.compression
    );

    let buffered = BufReader::with_capacity(chunk_size.max(1), outer.into_inner());
    let mut inner = BinaryReader::new(header.compression.decompressor(buffered));

    let mut chunks = IndexMap::new();
    while let Some(tag) = read_chunk_tag(&mut inner)? {
        let chunk = read_chunk(&mut inner, &tag)?;
        debug!("chunk {tag}: {} records", chunk.records.len());
        chunks.insert(tag, chunk);
    }

    Ok(Savegame {
        savegame_version: header.version,
        chunks,
    })
}

/// Read the next chunk tag, or `None` once the stream terminator has
/// been consumed and nothing follows it.
fn read_chunk_tag<R: Read>(
    reader: &mut BinaryReader<R>,
) -> Result<Option<String>, SavegameError> {
    let mut tag = [0u8; 4];
    match reader.read_up_to(&mut tag)? {
        4 => {}
        0 => return Err(SavegameError::UnexpectedEof),
        _ => return Err(SavegameError::InvalidSavegame),
    }

    if tag == [0; 4] {
        // The zero tag is written like a chunk header, so one more byte
        // belongs to it; a stream that stops right at the tag is fine
        // too. Anything readable past that is junk.
        let mut byte = [0u8; 1];
        if reader.read_up_to(&mut byte)? == 0 {
            return Ok(None);
        }
        if reader.read_up_to(&mut byte)? == 0 {
            return Ok(None);
        }
        return Err(SavegameError::TrailingJunk);
    }

    Ok(Some(String::from_utf8_lossy(&tag).to_string()))
}

fn read_chunk<R: Read>(reader: &mut BinaryReader<R>, tag: &str) -> Result<Chunk, SavegameError> {
    let mode = reader.read_u8()?;
    let chunk_type = ChunkType::try_from(mode)?;

    match chunk_type {
        ChunkType::Riff => {
            // The high nibble of the mode byte extends the 24-bit size
            let size = u64::from(mode >> 4) << 24 | u64::from(reader.read_u24()?);
            reader.skip(size)?;
            Ok(Chunk::unsupported())
        }
        ChunkType::Array | ChunkType::SparseArray => {
            loop {
                let (size_plus_one, _) = reader.read_gamma()?;
                if size_plus_one == 0 {
                    break;
                }
                reader.skip(size_plus_one - 1)?;
            }
            Ok(Chunk::unsupported())
        }
        ChunkType::Table | ChunkType::SparseTable => {
            let headers = chunk::read_table_headers(reader)?;
            let records = record::read_records(reader, tag, chunk_type, &headers)?;
            Ok(Chunk { headers, records })
        }
    }
}
