//! MySQL type conversion utilities.
//!
//! This module handles conversion between MySQL-specific types (from SQLx)
//! and the generic `Value` type used across all database drivers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlColumn, MySqlRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::services::database::traits::{Row as TraitRow, Value};

/// Converter for MySQL values to the unified `Value` type.
pub struct MySqlValueConverter;

impl MySqlValueConverter {
    /// Convert a MySQL row to a trait Row.
    pub fn convert_row(mysql_row: &MySqlRow) -> TraitRow {
        let columns = Self::column_names(mysql_row.columns());
        let values = mysql_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Self::extract_value(mysql_row, col, idx))
            .collect();

        TraitRow::from_parts(&columns, values)
    }

    pub fn column_names(columns: &[MySqlColumn]) -> Vec<String> {
        columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Extract a value from a MySQL row at the given column index.
    fn extract_value(row: &MySqlRow, column: &MySqlColumn, index: usize) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        let type_name = column.type_info().name();
        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its MySQL type name.
    fn decode_by_type(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        match type_name {
            // Boolean (MySQL uses TINYINT(1) for booleans)
            "BOOLEAN" | "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::from)
                .unwrap_or(Value::Null),

            // Integers
            "TINYINT" => row
                .try_get::<i8, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "TINYINT UNSIGNED" => row
                .try_get::<u8, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "SMALLINT" => row
                .try_get::<i16, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "SMALLINT UNSIGNED" => row
                .try_get::<u16, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "MEDIUMINT" | "INT" | "INTEGER" => row
                .try_get::<i32, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "INTEGER UNSIGNED" => row
                .try_get::<u32, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "BIGINT" => row
                .try_get::<i64, _>(index)
                .map(Value::Integer)
                .unwrap_or(Value::Null),

            // Values above i64::MAX keep their exact digits as text
            "BIGINT UNSIGNED" => row
                .try_get::<u64, _>(index)
                .map(|v| {
                    i64::try_from(v)
                        .map(Value::Integer)
                        .unwrap_or_else(|_| Value::Text(v.to_string()))
                })
                .unwrap_or(Value::Null),

            // Floating point
            "FLOAT" => row
                .try_get::<f32, _>(index)
                .map(|v| Value::Float(v.into()))
                .unwrap_or(Value::Null),

            "DOUBLE" | "DOUBLE PRECISION" | "REAL" => row
                .try_get::<f64, _>(index)
                .map(Value::Float)
                .unwrap_or(Value::Null),

            // Numeric/Decimal keep full precision as text
            "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => row
                .try_get::<Decimal, _>(index)
                .map(|d| Value::Text(d.to_string()))
                .unwrap_or(Value::Null),

            // Text types
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            // Binary types
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(|bytes| Value::from_bytes(&bytes))
                .unwrap_or(Value::Null),

            // Date/Time types
            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(Value::Date)
                .unwrap_or(Value::Null),

            "TIME" => row
                .try_get::<NaiveTime, _>(index)
                .map(|t| Value::Text(t.to_string()))
                .unwrap_or(Value::Null),

            "DATETIME" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(|dt| Value::Text(dt.to_string()))
                .unwrap_or(Value::Null),

            "TIMESTAMP" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(|dt| Value::Text(dt.to_string()))
                .or_else(|_| {
                    row.try_get::<NaiveDateTime, _>(index)
                        .map(|dt| Value::Text(dt.to_string()))
                })
                .unwrap_or(Value::Null),

            "YEAR" => row
                .try_get::<u16, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            // JSON type
            "JSON" => row
                .try_get::<serde_json::Value, _>(index)
                .map(|json| Value::Text(json.to_string()))
                .unwrap_or(Value::Null),

            // ENUM and SET types - treat as strings
            _ if type_name.starts_with("ENUM") || type_name.starts_with("SET") => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            // For unknown types, try to get as string representation
            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    /// Fallback: try to decode as string representation for unknown types.
    fn decode_as_string_fallback(row: &MySqlRow, index: usize, type_name: &str) -> Value {
        if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            return Value::Text(s);
        }
        if let Ok(v) = row.try_get_unchecked::<i64, _>(index) {
            return Value::Integer(v);
        }
        if let Ok(v) = row.try_get_unchecked::<f64, _>(index) {
            return Value::Float(v);
        }

        tracing::debug!(type_name, index, "undecodable MySQL value");
        Value::Null
    }
}
