/// Record and field decoding for self-describing chunks
use std::io::Read;

use indexmap::IndexMap;
use serde::Serialize;

use crate::chunk::{ChunkType, FieldDecl, FieldType, Headers};
use crate::error::SavegameError;
use crate::reader::BinaryReader;

/// Chunks known to carry opaque script data after their declared
/// fields. For every other tag, leftover record bytes are an error.
/// This list is closed; it mirrors the producers that actually exist.
const OPAQUE_TAIL_TAGS: [&str; 2] = ["GSDT", "AIPL"];

/// A decoded field value. Integers keep the declared width and
/// signedness; struct fields nest a whole record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    String(String),
    Struct(Record),
    List(Vec<Value>),
}

/// One decoded record, field name to value in declaration order.
pub type Record = IndexMap<String, Value>;

impl Value {
    /// Numeric value widened to u64, if it is numeric and non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            Value::I8(v) => u64::try_from(v).ok(),
            Value::I16(v) => u64::try_from(v).ok(),
            Value::I32(v) => u64::try_from(v).ok(),
            Value::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Field lookup on a struct value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(record) => record.get(name),
            _ => None,
        }
    }
}

/// Read records until the zero-size terminator. TABLE records are
/// numbered implicitly from 0; SPARSE_TABLE records carry their index,
/// whose encoded width counts against the declared record size.
pub(crate) fn read_records<R: Read>(
    reader: &mut BinaryReader<R>,
    tag: &str,
    chunk_type: ChunkType,
    headers: &Headers,
) -> Result<IndexMap<String, Record>, SavegameError> {
    let mut records = IndexMap::new();
    let mut next_index: u64 = 0;
    loop {
        let (size_plus_one, _) = reader.read_gamma()?;
        if size_plus_one == 0 {
            break;
        }
        let mut size = size_plus_one - 1;
        let index = if chunk_type.is_sparse() {
            let (index, index_bytes) = reader.read_gamma()?;
            size = size
                .checked_sub(index_bytes as u64)
                .ok_or(SavegameError::InvalidSavegame)?;
            index
        } else {
            let index = next_index;
            next_index += 1;
            index
        };

        // A slot without payload is not a record
        if size == 0 {
            continue;
        }

        let start = reader.offset();
        let record = read_record(reader, headers, "root")?;
        let consumed = reader.offset() - start;
        if consumed < size && OPAQUE_TAIL_TAGS.contains(&tag) {
            reader.skip(size - consumed)?;
        } else if consumed != size {
            return Err(SavegameError::TrailingJunkInChunk(tag.to_string()));
        }
        records.insert(index.to_string(), record);
    }
    Ok(records)
}

/// Decode one record per the schema stored under `key`.
pub(crate) fn read_record<R: Read>(
    reader: &mut BinaryReader<R>,
    headers: &Headers,
    key: &str,
) -> Result<Record, SavegameError> {
    let fields = headers.get(key).ok_or(SavegameError::InvalidSavegame)?;
    let mut record = Record::new();
    for field in fields {
        let value = read_field(reader, headers, key, field)?;
        record.insert(field.name.clone(), value);
    }
    Ok(record)
}

fn read_field<R: Read>(
    reader: &mut BinaryReader<R>,
    headers: &Headers,
    key: &str,
    field: &FieldDecl,
) -> Result<Value, SavegameError> {
    // Strings are already gamma-delimited, so a list of strings is not
    // wrapped in an extra element count.
    if field.is_list && field.field_type != FieldType::String {
        let (count, _) = reader.read_gamma()?;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(read_single(reader, headers, key, field)?);
        }
        Ok(Value::List(items))
    } else {
        read_single(reader, headers, key, field)
    }
}

fn read_single<R: Read>(
    reader: &mut BinaryReader<R>,
    headers: &Headers,
    key: &str,
    field: &FieldDecl,
) -> Result<Value, SavegameError> {
    let value = match field.field_type {
        FieldType::I8 => Value::I8(reader.read_i8()?),
        FieldType::U8 => Value::U8(reader.read_u8()?),
        FieldType::I16 => Value::I16(reader.read_i16()?),
        FieldType::U16 => Value::U16(reader.read_u16()?),
        FieldType::I32 => Value::I32(reader.read_i32()?),
        FieldType::U32 => Value::U32(reader.read_u32()?),
        FieldType::I64 => Value::I64(reader.read_i64()?),
        FieldType::U64 => Value::U64(reader.read_u64()?),
        FieldType::StringId => Value::U16(reader.read_u16()?),
        FieldType::String => Value::String(reader.read_gamma_str()?),
        FieldType::Struct => {
            let child_key = format!("{key}.{}", field.name);
            Value::Struct(read_record(reader, headers, &child_key)?)
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::encode_gamma;

    fn decl(field_type: FieldType, is_list: bool, name: &str) -> FieldDecl {
        FieldDecl {
            field_type,
            is_list,
            name: name.to_string(),
        }
    }

    #[test]
    fn scalar_fields_in_declaration_order() {
        let mut headers = Headers::new();
        headers.insert(
            "root".to_string(),
            vec![
                decl(FieldType::U8, false, "a"),
                decl(FieldType::I16, false, "b"),
                decl(FieldType::String, false, "c"),
            ],
        );

        let mut data = vec![0x2A, 0xFF, 0xFE];
        data.extend_from_slice(&encode_gamma(2));
        data.extend_from_slice(b"hi");

        let mut reader = BinaryReader::new(data.as_slice());
        let record = read_record(&mut reader, &headers, "root").unwrap();

        let names: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(record["a"], Value::U8(42));
        assert_eq!(record["b"], Value::I16(-2));
        assert_eq!(record["c"], Value::String("hi".to_string()));
        assert_eq!(reader.offset(), 6);
    }

    #[test]
    fn list_fields_read_a_count_prefix() {
        let mut headers = Headers::new();
        headers.insert(
            "root".to_string(),
            vec![decl(FieldType::U16, true, "values")],
        );

        let data = [0x03, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03];
        let mut reader = BinaryReader::new(&data[..]);
        let record = read_record(&mut reader, &headers, "root").unwrap();

        assert_eq!(
            record["values"],
            Value::List(vec![Value::U16(1), Value::U16(2), Value::U16(3)])
        );
    }

    #[test]
    fn string_list_is_just_a_string() {
        // The list bit on a STRING field does not add a count prefix
        let mut headers = Headers::new();
        headers.insert(
            "root".to_string(),
            vec![decl(FieldType::String, true, "name")],
        );

        let mut data = encode_gamma(3);
        data.extend_from_slice(b"abc");
        let mut reader = BinaryReader::new(data.as_slice());
        let record = read_record(&mut reader, &headers, "root").unwrap();

        assert_eq!(record["name"], Value::String("abc".to_string()));
        assert_eq!(reader.offset(), 4);
    }

    #[test]
    fn stringid_reads_as_u16() {
        let mut headers = Headers::new();
        headers.insert(
            "root".to_string(),
            vec![decl(FieldType::StringId, false, "title")],
        );

        let mut reader = BinaryReader::new(&[0x30, 0x39][..]);
        let record = read_record(&mut reader, &headers, "root").unwrap();
        assert_eq!(record["title"], Value::U16(12345));
    }

    #[test]
    fn struct_fields_recurse_through_dotted_keys() {
        let mut headers = Headers::new();
        headers.insert("root".to_string(), vec![decl(FieldType::Struct, true, "s")]);
        headers.insert(
            "root.s".to_string(),
            vec![decl(FieldType::U8, false, "v")],
        );

        let data = [0x02, 0x07, 0x09];
        let mut reader = BinaryReader::new(&data[..]);
        let record = read_record(&mut reader, &headers, "root").unwrap();

        let mut first = Record::new();
        first.insert("v".to_string(), Value::U8(7));
        let mut second = Record::new();
        second.insert("v".to_string(), Value::U8(9));
        assert_eq!(
            record["s"],
            Value::List(vec![Value::Struct(first), Value::Struct(second)])
        );
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::U8(7).as_u64(), Some(7));
        assert_eq!(Value::I32(-1).as_u64(), None);
        assert_eq!(Value::I64(12).as_u64(), Some(12));
        assert_eq!(Value::String("x".to_string()).as_u64(), None);

        let mut record = Record::new();
        record.insert("v".to_string(), Value::U8(1));
        let value = Value::Struct(record);
        assert_eq!(value.get("v"), Some(&Value::U8(1)));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::U8(0).get("v"), None);
    }
}
