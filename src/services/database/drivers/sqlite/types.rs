//! SQLite type conversion utilities.
//!
//! SQLite uses dynamic typing, so values are decoded by their storage class
//! (INTEGER, REAL, TEXT, BLOB, NULL). The declared column type is only
//! consulted to recognize dates stored as ISO text.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteColumn, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::services::database::traits::{Row as TraitRow, Value};

/// Converter for SQLite values to the unified `Value` type.
pub struct SqliteValueConverter;

impl SqliteValueConverter {
    /// Convert a SQLite row to a trait Row.
    pub fn convert_row(sqlite_row: &SqliteRow) -> TraitRow {
        let columns = Self::column_names(sqlite_row.columns());
        let values = sqlite_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Self::extract_value(sqlite_row, col, idx))
            .collect();

        TraitRow::from_parts(&columns, values)
    }

    pub fn column_names(columns: &[SqliteColumn]) -> Vec<String> {
        columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Extract a value from a SQLite row at the given column index.
    fn extract_value(row: &SqliteRow, column: &SqliteColumn, index: usize) -> Value {
        let storage_class = match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Ok(raw) => raw.type_info().name().to_uppercase(),
            Err(_) => return Value::Null,
        };

        let declared = column.type_info().name().to_uppercase();
        if declared == "DATE" {
            return Self::decode_date(row, index);
        }

        Self::decode_by_storage_class(row, index, &storage_class)
    }

    fn decode_by_storage_class(row: &SqliteRow, index: usize, storage_class: &str) -> Value {
        match storage_class {
            "INTEGER" => row
                .try_get::<i64, _>(index)
                .map(Value::Integer)
                .unwrap_or(Value::Null),

            "REAL" => row
                .try_get::<f64, _>(index)
                .map(Value::Float)
                .unwrap_or(Value::Null),

            "TEXT" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            "BLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(|bytes| Value::from_bytes(&bytes))
                .unwrap_or(Value::Null),

            _ => Self::decode_unknown(row, index),
        }
    }

    /// Decode a DATE column stored as `YYYY-MM-DD` text.
    ///
    /// Text that does not parse is returned unchanged.
    fn decode_date(row: &SqliteRow, index: usize) -> Value {
        if let Ok(s) = row.try_get::<String, _>(index) {
            return NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::Text(s));
        }

        Self::decode_unknown(row, index)
    }

    /// Decode an unknown type by trying common paths.
    fn decode_unknown(row: &SqliteRow, index: usize) -> Value {
        if let Ok(v) = row.try_get_unchecked::<i64, _>(index) {
            return Value::Integer(v);
        }
        if let Ok(v) = row.try_get_unchecked::<f64, _>(index) {
            return Value::Float(v);
        }
        if let Ok(v) = row.try_get_unchecked::<String, _>(index) {
            return Value::Text(v);
        }
        if let Ok(v) = row.try_get_unchecked::<Vec<u8>, _>(index) {
            return Value::from_bytes(&v);
        }

        Value::Null
    }
}
