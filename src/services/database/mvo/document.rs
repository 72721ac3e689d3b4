//! In-memory model of an MVO document and its JSON encoding.
//!
//! An MVO file is a single JSON object mapping table names to
//! `{"columns": [...], "rows": [[...], ...]}`. Top-level keys starting with
//! `$` hold document metadata (the writer emits `"$version"`) and are never
//! treated as tables. Table order follows the document.

use std::path::Path;

use serde_json::{Map, Number, Value as JsonValue};

use crate::services::database::error::{DbError, Result};
use crate::services::database::traits::Value;

/// Format version written by [`EmbeddedDatabase::save`].
pub const FORMAT_VERSION: u64 = 1;

const VERSION_KEY: &str = "$version";
const METADATA_PREFIX: char = '$';

/// Ordered column names of one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSchema {
    pub columns: Vec<String>,
}

/// One table: schema plus rows aligned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    schema: TableSchema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn columns(&self) -> &[String] {
        &self.schema.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

/// A whole MVO database held in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmbeddedDatabase {
    tables: Vec<Table>,
}

impl EmbeddedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse an MVO file.
    ///
    /// # Errors
    ///
    /// A file that cannot be read is a connection error; a file that is read
    /// but is not a valid document is `CorruptDatabase`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            DbError::connection(format!(
                "cannot open MVO database {}: {e}",
                path.display()
            ))
        })?;
        Self::from_slice(&bytes, path)
    }

    /// Parse document bytes; `origin` is only used in error messages.
    pub fn from_slice(bytes: &[u8], origin: &Path) -> Result<Self> {
        let document: JsonValue = serde_json::from_slice(bytes)
            .map_err(|e| DbError::corrupt(origin, format!("invalid MVO document: {e}")))?;

        let JsonValue::Object(entries) = document else {
            return Err(DbError::corrupt(
                origin,
                "top level of an MVO document must be an object",
            ));
        };

        let mut database = Self::new();
        for (name, body) in entries {
            if name.starts_with(METADATA_PREFIX) {
                continue;
            }
            let table = parse_table(&name, body).map_err(|message| {
                DbError::corrupt(origin, format!("table '{name}': {message}"))
            })?;
            database.tables.push(table);
        }

        Ok(database)
    }

    /// Add a table, validating that every row matches the column list.
    pub fn add_table(
        &mut self,
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<()> {
        let name = name.into();
        if name.starts_with(METADATA_PREFIX) {
            return Err(DbError::Schema {
                message: format!("table name '{name}' is reserved for metadata"),
            });
        }
        if self.table(&name).is_some() {
            return Err(DbError::Schema {
                message: format!("table '{name}' already exists"),
            });
        }
        if let Some(duplicate) = find_duplicate(&columns) {
            return Err(DbError::Schema {
                message: format!("duplicate column '{duplicate}' in table '{name}'"),
            });
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(DbError::Schema {
                message: format!(
                    "row {index} of table '{name}' has {} values for {} columns",
                    row.len(),
                    columns.len()
                ),
            });
        }

        self.tables.push(Table {
            name,
            schema: TableSchema { columns },
            rows,
        });
        Ok(())
    }

    /// Table names in document order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Exact, case-sensitive lookup.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Encode as a JSON document, version key first.
    pub fn to_json(&self) -> JsonValue {
        let mut document = Map::new();
        document.insert(VERSION_KEY.to_string(), JsonValue::from(FORMAT_VERSION));

        for table in &self.tables {
            let rows = table
                .rows
                .iter()
                .map(|row| JsonValue::Array(row.iter().map(value_to_json).collect()))
                .collect();

            let mut body = Map::new();
            body.insert(
                "columns".to_string(),
                JsonValue::Array(
                    table
                        .schema
                        .columns
                        .iter()
                        .map(|c| JsonValue::String(c.clone()))
                        .collect(),
                ),
            );
            body.insert("rows".to_string(), JsonValue::Array(rows));
            document.insert(table.name.clone(), JsonValue::Object(body));
        }

        JsonValue::Object(document)
    }

    /// Write the document to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.to_json())
            .map_err(|e| DbError::io(path, std::io::Error::other(e)))?;
        std::fs::write(path, text).map_err(|e| DbError::io(path, e))
    }
}

fn parse_table(name: &str, body: JsonValue) -> std::result::Result<Table, String> {
    let JsonValue::Object(mut body) = body else {
        return Err("expected an object with 'columns' and 'rows'".to_string());
    };

    let columns = match body.remove("columns") {
        Some(JsonValue::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::String(column) => Ok(column),
                other => Err(format!("column names must be strings, found {other}")),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
        Some(_) => return Err("'columns' must be an array".to_string()),
        None => return Err("missing 'columns'".to_string()),
    };

    if let Some(duplicate) = find_duplicate(&columns) {
        return Err(format!("duplicate column '{duplicate}'"));
    }

    let rows = match body.remove("rows") {
        Some(JsonValue::Array(items)) => items,
        Some(_) => return Err("'rows' must be an array".to_string()),
        None => Vec::new(),
    };

    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let JsonValue::Array(cells) = row else {
                return Err(format!("row {index} is not an array"));
            };
            if cells.len() != columns.len() {
                return Err(format!(
                    "row {index} has {} values for {} columns",
                    cells.len(),
                    columns.len()
                ));
            }
            cells
                .into_iter()
                .map(|cell| json_to_value(cell).map_err(|e| format!("row {index}: {e}")))
                .collect()
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Table {
        name: name.to_string(),
        schema: TableSchema { columns },
        rows,
    })
}

fn json_to_value(cell: JsonValue) -> std::result::Result<Value, String> {
    match cell {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Integer(b as i64)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Integer(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("unrepresentable number {n}")),
        },
        JsonValue::String(s) => Ok(Value::Text(s)),
        JsonValue::Array(_) | JsonValue::Object(_) => {
            Err("cells must be scalars, found a nested structure".to_string())
        }
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
    }
}

fn find_duplicate(columns: &[String]) -> Option<&str> {
    columns
        .iter()
        .enumerate()
        .find(|(i, column)| columns[..*i].contains(column))
        .map(|(_, column)| column.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<EmbeddedDatabase> {
        EmbeddedDatabase::from_slice(text.as_bytes(), Path::new("test.mvo"))
    }

    #[test]
    fn test_parse_preserves_document_order() {
        let db = parse(
            r#"{
                "Zeta": {"columns": ["a"], "rows": [[1]]},
                "Alpha": {"columns": ["b"], "rows": []},
                "Mid": {"columns": [], "rows": []}
            }"#,
        )
        .unwrap();

        assert_eq!(db.table_names(), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_parse_values() {
        let db = parse(
            r#"{"T": {"columns": ["i", "f", "s", "n", "b"],
                      "rows": [[7, 2.5, "x", null, true]]}}"#,
        )
        .unwrap();

        let table = db.table("T").unwrap();
        assert_eq!(
            table.rows()[0],
            vec![
                Value::Integer(7),
                Value::Float(2.5),
                Value::Text("x".into()),
                Value::Null,
                Value::Integer(1),
            ]
        );
    }

    #[test]
    fn test_metadata_keys_are_not_tables() {
        let db = parse(r#"{"$version": 1, "T": {"columns": ["a"], "rows": []}}"#).unwrap();
        assert_eq!(db.table_names(), vec!["T"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let db = parse(r#"{"Employees": {"columns": ["id"], "rows": []}}"#).unwrap();
        assert!(db.table("Employees").is_some());
        assert!(db.table("employees").is_none());
    }

    #[test]
    fn test_corrupt_documents() {
        let cases = [
            "not json at all",
            "[1, 2, 3]",
            r#"{"T": [1, 2]}"#,
            r#"{"T": {"rows": []}}"#,
            r#"{"T": {"columns": [1], "rows": []}}"#,
            r#"{"T": {"columns": ["a", "a"], "rows": []}}"#,
            r#"{"T": {"columns": ["a"], "rows": [[1, 2]]}}"#,
            r#"{"T": {"columns": ["a"], "rows": [5]}}"#,
            r#"{"T": {"columns": ["a"], "rows": [[[1]]]}}"#,
        ];

        for case in cases {
            match parse(case) {
                Err(DbError::CorruptDatabase { .. }) => {}
                other => panic!("expected corrupt database for {case}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let err = EmbeddedDatabase::from_slice(&[0x7b, 0xff, 0xfe], Path::new("x.mvo")).unwrap_err();
        assert!(matches!(err, DbError::CorruptDatabase { .. }));
    }

    #[test]
    fn test_missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbeddedDatabase::load(&dir.path().join("absent.mvo")).unwrap_err();
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.mvo");

        let mut db = EmbeddedDatabase::new();
        db.add_table(
            "Departments",
            vec!["DepartmentID".into(), "DepartmentName".into()],
            vec![vec![Value::Integer(1), "IT".into()]],
        )
        .unwrap();
        db.add_table("Empty", vec!["x".into()], vec![]).unwrap();
        db.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"$version\": 1"));

        let loaded = EmbeddedDatabase::load(&path).unwrap();
        assert_eq!(loaded, db);
    }

    #[test]
    fn test_add_table_rejects_bad_input() {
        let mut db = EmbeddedDatabase::new();
        db.add_table("T", vec!["a".into()], vec![]).unwrap();

        assert!(db.add_table("T", vec!["a".into()], vec![]).is_err());
        assert!(db.add_table("$meta", vec![], vec![]).is_err());
        assert!(db.add_table("U", vec!["a".into(), "a".into()], vec![]).is_err());
        assert!(
            db.add_table("V", vec!["a".into()], vec![vec![Value::Null, Value::Null]])
                .is_err()
        );
        assert_eq!(db.len(), 1);
    }
}
