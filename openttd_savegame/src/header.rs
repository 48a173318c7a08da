use std::io::Read;

use crate::compression::CompressionType;
use crate::error::SavegameError;
use crate::reader::BinaryReader;

/// The fixed 8-byte frame at the start of every savegame: compression
/// tag, savegame version, and a reserved pair of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavegameHeader {
    pub compression: CompressionType,
    pub version: u16,
    pub flags: u16,
}

impl SavegameHeader {
    pub fn parse<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self, SavegameError> {
        let magic = reader.read_array::<4>()?;
        let compression = CompressionType::from_tag(&magic)?;
        let version = reader.read_u16()?;
        let flags = reader.read_u16()?;
        Ok(Self {
            compression,
            version,
            flags,
        })
    }
}
