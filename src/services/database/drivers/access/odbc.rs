//! ODBC session used by the Access handler.

use std::path::Path;

use chrono::NaiveDate;
use odbc_api::buffers::TextRowSet;
use odbc_api::parameter::InputParameter;
use odbc_api::{Connection, ConnectionOptions, Cursor, DataType, IntoParameter, ResultSetMetadata};

use crate::services::database::error::{DbError, Result};
use crate::services::database::traits::{QueryResult, Row, Value};

const BATCH_SIZE: usize = 1_000;
const MAX_TEXT_LEN: usize = 4_096;

/// Access reports undefined objects with these SQLSTATEs.
const UNDEFINED_OBJECT_STATES: [&str; 2] = ["42S02", "42S22"];

/// One open ODBC connection to an Access file.
pub struct Session {
    conn: Connection<'static>,
}

impl Session {
    pub fn open(path: &Path) -> Result<Self> {
        let env = odbc_api::environment()
            .map_err(|e| DbError::connection(format!("ODBC environment unavailable: {e}")))?;

        let connection_string = format!(
            "Driver={{Microsoft Access Driver (*.mdb, *.accdb)}};DBQ={};",
            path.display()
        );
        let conn = env
            .connect_with_connection_string(&connection_string, ConnectionOptions::default())
            .map_err(|e| {
                DbError::connection(format!(
                    "cannot open Access database {}: {e}",
                    path.display()
                ))
            })?;

        Ok(Self { conn })
    }

    /// User tables as reported by `SQLTables`, without `MSys*` system tables.
    pub fn tables(&mut self) -> Result<Vec<String>> {
        let cursor = self
            .conn
            .tables("", "", "", "TABLE")
            .map_err(|e| classify_error("SQLTables", e))?;

        let result = read_text_cursor(cursor).map_err(|e| classify_error("SQLTables", e))?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.get("TABLE_NAME").and_then(Value::as_str))
            .filter(|name| !name.starts_with("MSys"))
            .map(str::to_string)
            .collect())
    }

    pub fn query(&mut self, query: &str, params: &[Value]) -> Result<QueryResult> {
        let params: Vec<Box<dyn InputParameter>> = params.iter().map(to_parameter).collect();

        let cursor = self
            .conn
            .execute(query, params.as_slice(), None)
            .map_err(|e| classify_error(query, e))?;

        match cursor {
            Some(cursor) => read_typed_cursor(cursor).map_err(|e| classify_error(query, e)),
            None => Ok(QueryResult::default()),
        }
    }
}

fn to_parameter(value: &Value) -> Box<dyn InputParameter> {
    match value {
        Value::Null => Box::new(None::<String>.into_parameter()),
        Value::Integer(v) => Box::new(*v),
        Value::Float(v) => Box::new(*v),
        Value::Text(s) => Box::new(s.clone().into_parameter()),
        Value::Date(d) => Box::new(d.format("%Y-%m-%d").to_string().into_parameter()),
    }
}

fn column_names(cursor: &mut impl ResultSetMetadata) -> odbc_api::Result<Vec<String>> {
    cursor.column_names()?.collect()
}

fn read_text_cursor(mut cursor: impl Cursor) -> odbc_api::Result<QueryResult> {
    let columns = column_names(&mut cursor)?;
    let kinds = vec![DataType::Unknown; columns.len()];
    read_rows(cursor, columns, kinds)
}

fn read_typed_cursor(mut cursor: impl Cursor) -> odbc_api::Result<QueryResult> {
    let columns = column_names(&mut cursor)?;
    let kinds = (1..=columns.len())
        .map(|index| cursor.col_data_type(index as u16))
        .collect::<odbc_api::Result<Vec<_>>>()?;
    read_rows(cursor, columns, kinds)
}

fn read_rows(
    mut cursor: impl Cursor,
    columns: Vec<String>,
    kinds: Vec<DataType>,
) -> odbc_api::Result<QueryResult> {
    let buffer = TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN))?;
    let mut row_set = cursor.bind_buffer(buffer)?;

    let mut rows = Vec::new();
    while let Some(batch) = row_set.fetch()? {
        for row_index in 0..batch.num_rows() {
            let values = kinds
                .iter()
                .enumerate()
                .map(|(col_index, kind)| decode(batch.at(col_index, row_index), kind))
                .collect();
            rows.push(Row::from_parts(&columns, values));
        }
    }

    Ok(QueryResult::new(columns, rows))
}

/// Map a text-rendered ODBC field onto `Value` using the column's SQL type.
fn decode(field: Option<&[u8]>, kind: &DataType) -> Value {
    let Some(bytes) = field else {
        return Value::Null;
    };
    let text = String::from_utf8_lossy(bytes).into_owned();

    match kind {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt
        | DataType::Bit => text
            .trim()
            .parse()
            .map(Value::Integer)
            .unwrap_or(Value::Text(text)),
        DataType::Real | DataType::Float { .. } | DataType::Double => text
            .trim()
            .parse()
            .map(Value::Float)
            .unwrap_or(Value::Text(text)),
        DataType::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Value::Date)
            .unwrap_or(Value::Text(text)),
        _ => Value::Text(text),
    }
}

fn classify_error(query: &str, error: odbc_api::Error) -> DbError {
    let message = error.to_string();
    if UNDEFINED_OBJECT_STATES
        .iter()
        .any(|state| message.contains(state))
    {
        DbError::Schema { message }
    } else {
        DbError::Query {
            query: query.to_string(),
            message,
        }
    }
}
