//! dBase III/IV table file format.
//!
//! ```text
//! offset  size  header
//!      0     1  version (0x03 for dBase III without memo)
//!      1     3  last update, YY MM DD (YY counted from 1900)
//!      4     4  record count, u32 LE
//!      8     2  header length, u16 LE
//!     10     2  record length, u16 LE (includes the deletion flag)
//!     12    20  reserved
//!     32  32*n  field descriptors, terminated by 0x0D
//! ```
//!
//! Each record starts with a deletion flag (`' '` live, `'*'` deleted)
//! followed by the fixed-width field bytes. The file ends with 0x1A.

use std::path::Path;

use bytes::{Buf, BufMut};
use chrono::{Datelike, NaiveDate, Utc};

use crate::services::database::error::{DbError, Result};
use crate::services::database::traits::Value;

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const NAME_LEN: usize = 11;
const FIELD_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const DELETED: u8 = b'*';
const LIVE: u8 = b' ';
const VERSION_DBASE_III: u8 = 0x03;

/// Field type code from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `C`: space-padded text
    Character,
    /// `N`: ASCII number, integer when the field has no decimals
    Numeric,
    /// `F`: ASCII floating point number
    Float,
    /// `D`: `YYYYMMDD`
    Date,
    /// `L`: `T`/`F`/`Y`/`N`/`?`
    Logical,
    /// `I`: little-endian i32
    Integer,
    /// Any other code, read back as trimmed text
    Other(u8),
}

impl FieldKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            b'C' => Self::Character,
            b'N' => Self::Numeric,
            b'F' => Self::Float,
            b'D' => Self::Date,
            b'L' => Self::Logical,
            b'I' => Self::Integer,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Numeric => b'N',
            Self::Float => b'F',
            Self::Date => b'D',
            Self::Logical => b'L',
            Self::Integer => b'I',
            Self::Other(code) => *code,
        }
    }
}

/// One column of a dBase table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub length: u8,
    pub decimals: u8,
}

impl FieldDescriptor {
    pub fn character(name: impl Into<String>, length: u8) -> Self {
        Self::new(name, FieldKind::Character, length, 0)
    }

    pub fn numeric(name: impl Into<String>, length: u8, decimals: u8) -> Self {
        Self::new(name, FieldKind::Numeric, length, decimals)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date, 8, 0)
    }

    pub fn logical(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Logical, 1, 0)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer, 4, 0)
    }

    fn new(name: impl Into<String>, kind: FieldKind, length: u8, decimals: u8) -> Self {
        Self {
            name: name.into(),
            kind,
            length,
            decimals,
        }
    }

    /// Decode this field's raw bytes from one record.
    fn decode(&self, raw: &[u8]) -> Value {
        match self.kind {
            FieldKind::Character => {
                let text = String::from_utf8_lossy(raw);
                Value::Text(text.trim_end_matches([' ', '\0']).to_string())
            }
            FieldKind::Numeric | FieldKind::Float => {
                let text = trimmed(raw);
                if text.is_empty() || text.chars().all(|c| c == '*') {
                    return Value::Null;
                }
                if self.decimals == 0 {
                    if let Ok(v) = text.parse::<i64>() {
                        return Value::Integer(v);
                    }
                }
                text.parse::<f64>()
                    .map(Value::Float)
                    .unwrap_or(Value::Text(text))
            }
            FieldKind::Date => {
                let text = trimmed(raw);
                if text.is_empty() || text.chars().all(|c| c == '0') {
                    return Value::Null;
                }
                NaiveDate::parse_from_str(&text, "%Y%m%d")
                    .map(Value::Date)
                    .unwrap_or(Value::Text(text))
            }
            FieldKind::Logical => match raw.first() {
                Some(b'T' | b't' | b'Y' | b'y') => Value::Integer(1),
                Some(b'F' | b'f' | b'N' | b'n') => Value::Integer(0),
                _ => Value::Null,
            },
            FieldKind::Integer => match <[u8; 4]>::try_from(raw) {
                Ok(bytes) => Value::Integer(i32::from_le_bytes(bytes).into()),
                Err(_) => Value::Null,
            },
            FieldKind::Other(_) => Value::Text(trimmed(raw)),
        }
    }

    /// Encode `value` into exactly `length` bytes.
    fn encode(&self, value: &Value, out: &mut Vec<u8>) -> std::result::Result<(), String> {
        let width = usize::from(self.length);
        match (self.kind, value) {
            (FieldKind::Integer, Value::Null) => out.put_i32_le(0),
            (FieldKind::Integer, Value::Integer(v)) => {
                let v = i32::try_from(*v).map_err(|_| format!("{v} does not fit in an I field"))?;
                out.put_i32_le(v);
            }
            (FieldKind::Logical, Value::Null) => out.put_u8(b'?'),
            (FieldKind::Logical, Value::Integer(v)) => out.put_u8(if *v != 0 { b'T' } else { b'F' }),
            (FieldKind::Date, Value::Null) => out.put_bytes(LIVE, width),
            (FieldKind::Date, Value::Date(d)) => {
                out.put_slice(d.format("%Y%m%d").to_string().as_bytes())
            }
            (FieldKind::Numeric | FieldKind::Float, Value::Null) => out.put_bytes(LIVE, width),
            (FieldKind::Numeric | FieldKind::Float, Value::Integer(_) | Value::Float(_)) => {
                let number = value.as_f64().unwrap_or_default();
                let text = if self.decimals == 0 {
                    value
                        .as_i64()
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| format!("{number:.0}"))
                } else {
                    format!("{number:.*}", usize::from(self.decimals))
                };
                if text.len() > width {
                    return Err(format!("{text} is wider than {width} characters"));
                }
                out.put_bytes(LIVE, width - text.len());
                out.put_slice(text.as_bytes());
            }
            (FieldKind::Character | FieldKind::Other(_), value) => {
                let text = value.to_display_string();
                let mut bytes = text.as_bytes();
                if bytes.len() > width {
                    bytes = &bytes[..floor_char_boundary(&text, width)];
                }
                out.put_slice(bytes);
                out.put_bytes(LIVE, width - bytes.len());
            }
            (kind, value) => {
                return Err(format!(
                    "cannot store a {} value in a {} field",
                    value.type_name(),
                    char::from(kind.code())
                ));
            }
        }
        Ok(())
    }
}

/// A fully decoded table: descriptors plus live records.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfTable {
    pub fields: Vec<FieldDescriptor>,
    pub rows: Vec<Vec<Value>>,
}

impl DbfTable {
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// Read and decode a `.dbf` file.
///
/// # Errors
///
/// A file that cannot be read is a connection error; a truncated or
/// malformed file is `CorruptDatabase`.
pub fn read_table(path: &Path) -> Result<DbfTable> {
    let bytes = std::fs::read(path).map_err(|e| {
        DbError::connection(format!("cannot open dBase file {}: {e}", path.display()))
    })?;
    parse_table(&bytes, path)
}

/// Decode `.dbf` bytes; `origin` is only used in error messages.
pub fn parse_table(bytes: &[u8], origin: &Path) -> Result<DbfTable> {
    let corrupt = |message: String| DbError::corrupt(origin, message);

    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!(
            "header is {} bytes, expected at least {HEADER_LEN}",
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_LEN];
    header.advance(4);
    let record_count = header.get_u32_le() as usize;
    let header_len = usize::from(header.get_u16_le());
    let record_len = usize::from(header.get_u16_le());

    if header_len <= HEADER_LEN || header_len > bytes.len() {
        return Err(corrupt(format!("invalid header length {header_len}")));
    }

    let fields = parse_descriptors(&bytes[HEADER_LEN..header_len]).map_err(corrupt)?;

    let expected_len = 1 + fields.iter().map(|f| usize::from(f.length)).sum::<usize>();
    if record_len != expected_len {
        return Err(corrupt(format!(
            "record length {record_len} does not match field descriptors ({expected_len})"
        )));
    }

    let data = &bytes[header_len..];
    let data_len = record_count
        .checked_mul(record_len)
        .filter(|len| *len <= data.len())
        .ok_or_else(|| {
            corrupt(format!(
                "file holds {} record bytes, header announces {record_count} records of {record_len} bytes",
                data.len()
            ))
        })?;

    let rows = data[..data_len]
        .chunks_exact(record_len)
        .filter(|record| record[0] != DELETED)
        .map(|record| {
            let mut offset = 1;
            fields
                .iter()
                .map(|field| {
                    let end = offset + usize::from(field.length);
                    let value = field.decode(&record[offset..end]);
                    offset = end;
                    value
                })
                .collect()
        })
        .collect();

    Ok(DbfTable { fields, rows })
}

fn parse_descriptors(mut area: &[u8]) -> std::result::Result<Vec<FieldDescriptor>, String> {
    let mut fields = Vec::new();

    loop {
        match area.first() {
            Some(&FIELD_TERMINATOR) => break,
            Some(_) if area.len() >= DESCRIPTOR_LEN => {}
            Some(_) => return Err("truncated field descriptor".to_string()),
            None => return Err("missing field descriptor terminator".to_string()),
        }

        let mut name = [0u8; NAME_LEN];
        area.copy_to_slice(&mut name);
        let kind = FieldKind::from_code(area.get_u8());
        area.advance(4);
        let length = area.get_u8();
        let decimals = area.get_u8();
        area.advance(DESCRIPTOR_LEN - NAME_LEN - 7);

        let end = name.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&name[..end]).trim().to_string();
        if name.is_empty() {
            return Err(format!("field {} has an empty name", fields.len() + 1));
        }
        if length == 0 {
            return Err(format!("field '{name}' has zero length"));
        }

        fields.push(FieldDescriptor {
            name,
            kind,
            length,
            decimals,
        });
    }

    if fields.is_empty() {
        return Err("table has no fields".to_string());
    }
    Ok(fields)
}

/// Encode a table as dBase III bytes.
pub fn encode_table(fields: &[FieldDescriptor], rows: &[Vec<Value>]) -> Result<Vec<u8>> {
    let schema_error = |message: String| DbError::Schema { message };

    if fields.is_empty() {
        return Err(schema_error("a dBase table needs at least one field".to_string()));
    }
    if let Some(field) = fields.iter().find(|f| f.name.is_empty() || f.name.len() >= NAME_LEN) {
        return Err(schema_error(format!(
            "field name '{}' must be 1 to {} bytes",
            field.name,
            NAME_LEN - 1
        )));
    }

    let record_len = 1 + fields.iter().map(|f| usize::from(f.length)).sum::<usize>();
    let header_len = HEADER_LEN + DESCRIPTOR_LEN * fields.len() + 1;
    let record_len = u16::try_from(record_len)
        .map_err(|_| schema_error(format!("record length {record_len} exceeds 65535")))?;
    let header_len = u16::try_from(header_len)
        .map_err(|_| schema_error(format!("too many fields ({})", fields.len())))?;
    let record_count = u32::try_from(rows.len())
        .map_err(|_| schema_error(format!("too many records ({})", rows.len())))?;

    let today = Utc::now().date_naive();
    let mut out = Vec::with_capacity(usize::from(header_len) + rows.len() * usize::from(record_len) + 1);

    out.put_u8(VERSION_DBASE_III);
    out.put_u8(u8::try_from(today.year() - 1900).unwrap_or(u8::MAX));
    out.put_u8(today.month() as u8);
    out.put_u8(today.day() as u8);
    out.put_u32_le(record_count);
    out.put_u16_le(header_len);
    out.put_u16_le(record_len);
    out.put_bytes(0, HEADER_LEN - 12);

    for field in fields {
        out.put_slice(field.name.as_bytes());
        out.put_bytes(0, NAME_LEN - field.name.len());
        out.put_u8(field.kind.code());
        out.put_bytes(0, 4);
        out.put_u8(field.length);
        out.put_u8(field.decimals);
        out.put_bytes(0, DESCRIPTOR_LEN - NAME_LEN - 7);
    }
    out.put_u8(FIELD_TERMINATOR);

    for (index, row) in rows.iter().enumerate() {
        if row.len() != fields.len() {
            return Err(schema_error(format!(
                "row {index} has {} values for {} fields",
                row.len(),
                fields.len()
            )));
        }
        out.put_u8(LIVE);
        for (field, value) in fields.iter().zip(row) {
            field
                .encode(value, &mut out)
                .map_err(|e| schema_error(format!("row {index}, field '{}': {e}", field.name)))?;
        }
    }
    out.put_u8(END_OF_FILE);

    Ok(out)
}

/// Write a table to `path` in dBase III format.
pub fn write_table(path: &Path, fields: &[FieldDescriptor], rows: &[Vec<Value>]) -> Result<()> {
    let bytes = encode_table(fields, rows)?;
    std::fs::write(path, bytes).map_err(|e| DbError::io(path, e))
}

fn trimmed(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches([' ', '\0'])
        .to_string()
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    (0..=index)
        .rev()
        .find(|i| text.is_char_boundary(*i))
        .unwrap_or(0)
}
