//! PostgreSQL type conversion utilities.
//!
//! This module handles conversion between PostgreSQL-specific types (from SQLx)
//! and the generic `Value` type used across all database drivers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::services::database::traits::{Row as TraitRow, Value};

/// Converter for PostgreSQL values to the unified `Value` type.
pub struct PgValueConverter;

impl PgValueConverter {
    /// Convert a PostgreSQL row to a trait Row.
    pub fn convert_row(pg_row: &PgRow) -> TraitRow {
        let columns = Self::column_names(pg_row.columns());
        let values = pg_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Self::extract_value(pg_row, col, idx))
            .collect();

        TraitRow::from_parts(&columns, values)
    }

    pub fn column_names(columns: &[PgColumn]) -> Vec<String> {
        columns.iter().map(|c| c.name().to_string()).collect()
    }

    /// Extract a value from a PostgreSQL row at the given column index.
    fn extract_value(row: &PgRow, column: &PgColumn, index: usize) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        let type_name = column.type_info().name();
        Self::decode_by_type(row, index, type_name)
    }

    /// Decode a value based on its PostgreSQL type name.
    fn decode_by_type(row: &PgRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::from)
                .unwrap_or(Value::Null),

            // Integers
            "INT2" => row
                .try_get::<i16, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "INT4" => row
                .try_get::<i32, _>(index)
                .map(|v| Value::Integer(v.into()))
                .unwrap_or(Value::Null),

            "INT8" => row
                .try_get::<i64, _>(index)
                .map(Value::Integer)
                .unwrap_or(Value::Null),

            // Floating point
            "FLOAT4" => row
                .try_get::<f32, _>(index)
                .map(|v| Value::Float(v.into()))
                .unwrap_or(Value::Null),

            "FLOAT8" => row
                .try_get::<f64, _>(index)
                .map(Value::Float)
                .unwrap_or(Value::Null),

            // Numeric keeps full precision as text
            "NUMERIC" => row
                .try_get::<Decimal, _>(index)
                .map(|d| Value::Text(d.to_string()))
                .unwrap_or(Value::Null),

            // Text types
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or(Value::Null),

            // Binary
            "BYTEA" => row
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

            "TIMESTAMP" => row
                .try_get::<NaiveDateTime, _>(index)
                .map(|dt| Value::Text(dt.to_string()))
                .unwrap_or(Value::Null),

            "TIMESTAMPTZ" => row
                .try_get::<DateTime<Utc>, _>(index)
                .map(|dt| Value::Text(dt.to_string()))
                .unwrap_or(Value::Null),

            "UUID" => row
                .try_get::<Uuid, _>(index)
                .map(|u| Value::Text(u.to_string()))
                .unwrap_or(Value::Null),

            "JSON" | "JSONB" => row
                .try_get::<serde_json::Value, _>(index)
                .map(|json| Value::Text(json.to_string()))
                .unwrap_or(Value::Null),

            // Array types - handle common ones
            "INT4[]" => Self::decode_array::<i32>(row, index),
            "INT8[]" => Self::decode_array::<i64>(row, index),
            "FLOAT8[]" => Self::decode_array::<f64>(row, index),
            "BOOL[]" => Self::decode_array::<bool>(row, index),
            "TEXT[]" | "VARCHAR[]" => Self::decode_text_array(row, index),

            // For unknown types, try to get as string representation
            _ => Self::decode_as_string_fallback(row, index, type_name),
        }
    }

    /// Decode an array into PostgreSQL's `{a,b,c}` text rendering.
    fn decode_array<T>(row: &PgRow, index: usize) -> Value
    where
        T: ToString,
        Vec<T>: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get::<Vec<T>, _>(index)
            .map(|items| {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                Value::Text(format!("{{{}}}", parts.join(",")))
            })
            .unwrap_or(Value::Null)
    }

    /// Text arrays quote each element, as PostgreSQL does.
    fn decode_text_array(row: &PgRow, index: usize) -> Value {
        row.try_get::<Vec<String>, _>(index)
            .map(|items| {
                let parts: Vec<String> = items
                    .iter()
                    .map(|s| format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")))
                    .collect();
                Value::Text(format!("{{{}}}", parts.join(",")))
            })
            .unwrap_or(Value::Null)
    }

    /// Fallback: try to decode as string representation for unknown types.
    fn decode_as_string_fallback(row: &PgRow, index: usize, type_name: &str) -> Value {
        if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
            return Value::Text(s);
        }

        tracing::debug!(type_name, index, "undecodable PostgreSQL value");
        Value::Null
    }
}
