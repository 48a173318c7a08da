/// Chunk framing and table headers for OpenTTD savegames
use std::io::Read;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::SavegameError;
use crate::reader::BinaryReader;

/// Bit in the field type byte marking a length-prefixed list.
pub const FIELD_TYPE_HAS_LENGTH_FIELD: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Riff = 0,        // Opaque binary blob
    Array = 1,       // Sequential array (deprecated)
    SparseArray = 2, // Sparse array (deprecated)
    Table = 3,       // Self-describing table
    SparseTable = 4, // Self-describing sparse table
}

impl ChunkType {
    /// Records carry an explicit gamma-encoded index.
    pub fn is_sparse(self) -> bool {
        matches!(self, ChunkType::SparseArray | ChunkType::SparseTable)
    }
}

impl TryFrom<u8> for ChunkType {
    type Error = SavegameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value & 0x0F {
            0 => Ok(ChunkType::Riff),
            1 => Ok(ChunkType::Array),
            2 => Ok(ChunkType::SparseArray),
            3 => Ok(ChunkType::Table),
            4 => Ok(ChunkType::SparseTable),
            other => Err(SavegameError::UnknownChunkType(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    I8 = 1,
    U8 = 2,
    I16 = 3,
    U16 = 4,
    I32 = 5,
    U32 = 6,
    I64 = 7,
    U64 = 8,
    StringId = 9,
    String = 10,
    Struct = 11,
}

impl TryFrom<u8> for FieldType {
    type Error = SavegameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value & 0x0F {
            1 => Ok(FieldType::I8),
            2 => Ok(FieldType::U8),
            3 => Ok(FieldType::I16),
            4 => Ok(FieldType::U16),
            5 => Ok(FieldType::I32),
            6 => Ok(FieldType::U32),
            7 => Ok(FieldType::I64),
            8 => Ok(FieldType::U64),
            9 => Ok(FieldType::StringId),
            10 => Ok(FieldType::String),
            11 => Ok(FieldType::Struct),
            other => Err(SavegameError::UnknownFieldType(other)),
        }
    }
}

/// One declared field of a table chunk's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub field_type: FieldType,
    pub is_list: bool,
    pub name: String,
}

/// Header schemas of one chunk. The root record's schema sits under
/// `"root"`; every struct field adds a child entry under the dotted
/// path `"<parent>.<name>"`.
pub type Headers = IndexMap<String, Vec<FieldDecl>>;

/// Parse the self-describing header block of a TABLE or SPARSE_TABLE
/// chunk. The block declares its own byte length; consuming any other
/// amount while parsing is an error.
pub(crate) fn read_table_headers<R: Read>(
    reader: &mut BinaryReader<R>,
) -> Result<Headers, SavegameError> {
    let (size, _) = reader.read_gamma()?;
    let declared = size.checked_sub(1).ok_or(SavegameError::InvalidSavegame)?;
    let start = reader.offset();

    let mut headers = Headers::new();
    let root = read_field_list(reader)?;
    headers.insert("root".to_string(), root.clone());
    read_sub_headers(reader, "root", &root, &mut headers)?;

    let consumed = reader.offset() - start;
    if consumed != declared {
        return Err(SavegameError::TableHeaderSizeMismatch { declared, consumed });
    }
    Ok(headers)
}

/// Read field declarations up to the zero terminator byte.
fn read_field_list<R: Read>(reader: &mut BinaryReader<R>) -> Result<Vec<FieldDecl>, SavegameError> {
    let mut fields = Vec::new();
    loop {
        let type_byte = reader.read_u8()?;
        if type_byte == 0 {
            break;
        }
        let field_type = FieldType::try_from(type_byte)?;
        let is_list = type_byte & FIELD_TYPE_HAS_LENGTH_FIELD != 0;
        let name = reader.read_gamma_str()?;
        fields.push(FieldDecl {
            field_type,
            is_list,
            name,
        });
    }
    Ok(fields)
}

/// Struct fields carry their own sub-header after the containing
/// header, one per struct field, depth-first in declaration order.
fn read_sub_headers<R: Read>(
    reader: &mut BinaryReader<R>,
    parent_key: &str,
    fields: &[FieldDecl],
    headers: &mut Headers,
) -> Result<(), SavegameError> {
    for field in fields.iter().filter(|f| f.field_type == FieldType::Struct) {
        let key = format!("{parent_key}.{}", field.name);
        let sub = read_field_list(reader)?;
        headers.insert(key.clone(), sub.clone());
        read_sub_headers(reader, &key, &sub, headers)?;
    }
    Ok(())
}
