//! MVO handler implementation.
//!
//! The whole document is loaded on `connect` and held until `close`; every
//! query runs against the in-memory copy.

use std::path::{Path, PathBuf};

use crate::services::database::drivers::embedded;
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::mvo::EmbeddedDatabase;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, DatabaseHandler, QueryResult, Row, Value,
};

/// Handler for `.mvo` embedded database files.
#[derive(Debug)]
pub struct MvoHandler {
    path: PathBuf,
    sink: LogSink,
    database: Option<EmbeddedDatabase>,
}

impl MvoHandler {
    /// Create a new MVO handler for `path`.
    ///
    /// This does not read the file - call `connect()` to load it.
    pub fn new(path: impl Into<PathBuf>, sink: LogSink) -> Self {
        Self {
            path: path.into(),
            sink,
            database: None,
        }
    }

    /// Create a boxed handler (for factory use).
    pub fn boxed(path: impl Into<PathBuf>, sink: LogSink) -> BoxedHandler {
        Box::new(Self::new(path, sink))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn loaded(&self) -> Result<&EmbeddedDatabase> {
        self.database.as_ref().ok_or(DbError::NotConnected)
    }

    fn release(&mut self) {
        if self.database.take().is_some() {
            tracing::info!(path = %self.path.display(), "closed MVO database");
        }
    }
}

impl DatabaseHandler for MvoHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::Mvo
    }

    fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    fn log_sink(&self) -> &LogSink {
        &self.sink
    }

    fn is_connected(&self) -> bool {
        self.database.is_some()
    }

    fn connect(&mut self) -> Result<()> {
        let sink = self.sink.clone();
        sink.scope(|| {
            self.release();

            let database = EmbeddedDatabase::load(&self.path).inspect_err(|e| {
                tracing::error!(path = %self.path.display(), error = %e, "cannot load MVO database");
            })?;

            tracing::info!(
                path = %self.path.display(),
                tables = database.len(),
                "loaded MVO database"
            );
            self.database = Some(database);
            Ok(())
        })
    }

    fn get_tables(&mut self) -> Result<Vec<String>> {
        self.sink.scope(|| {
            let tables = self.loaded()?.table_names();
            tracing::debug!(count = tables.len(), "listed MVO tables");
            Ok(tables)
        })
    }

    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.sink.scope(|| {
            let rows = embedded::execute(self.loaded()?, query, params)
                .inspect_err(|e| tracing::warn!(query, error = %e, "MVO query failed"))?;
            tracing::debug!(query, rows = rows.len(), "executed MVO query");
            Ok(rows)
        })
    }

    fn select_all(&mut self, table: &str) -> Result<QueryResult> {
        self.sink.scope(|| embedded::select_all(self.loaded()?, table))
    }

    fn close(&mut self) {
        let sink = self.sink.clone();
        sink.scope(|| self.release());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::logging::test_support::CapturedLogs;

    const EMPLOYEES: &str =
        r#"{"Employees": {"columns": ["id", "name"], "rows": [[1, "Ann"], [2, "Bo"]]}}"#;

    fn write_document(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mvo");
        std::fs::write(&path, text).unwrap();
        (dir, path)
    }

    fn connected(text: &str) -> (tempfile::TempDir, MvoHandler) {
        let (dir, path) = write_document(text);
        let mut handler = MvoHandler::new(path, LogSink::none());
        handler.connect().unwrap();
        (dir, handler)
    }

    #[test]
    fn test_employees_query() {
        let (_dir, mut handler) = connected(EMPLOYEES);

        let rows = handler.execute_query("SELECT * FROM Employees", &[]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("name"), Some(&Value::Text("Ann".into())));
        assert_eq!(rows[1].get("id"), Some(&Value::Integer(2)));
        assert_eq!(rows[1].get("name"), Some(&Value::Text("Bo".into())));
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_get_tables_in_document_order() {
        let (_dir, mut handler) = connected(
            r#"{"$version": 1,
                "Zeta": {"columns": ["a"], "rows": []},
                "Alpha": {"columns": ["b"], "rows": []}}"#,
        );

        assert_eq!(handler.get_tables().unwrap(), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_empty_document_has_no_tables() {
        let (_dir, mut handler) = connected("{}");
        assert!(handler.get_tables().unwrap().is_empty());
    }

    #[test]
    fn test_query_errors() {
        let (_dir, mut handler) = connected(EMPLOYEES);

        assert!(matches!(
            handler.execute_query("SELECT * FROM Missing", &[]),
            Err(DbError::Schema { .. })
        ));
        assert!(matches!(
            handler.execute_query("SELECT * FROM employees", &[]),
            Err(DbError::Schema { .. })
        ));
        assert!(matches!(
            handler.execute_query("SELECT name FROM Employees", &[]),
            Err(DbError::UnsupportedQuery { .. })
        ));
        assert!(matches!(
            handler.execute_query("SELECT * FROM Employees", &[Value::Integer(1)]),
            Err(DbError::UnsupportedQuery { .. })
        ));
    }

    #[test]
    fn test_select_all_keeps_columns_for_empty_table() {
        let (_dir, mut handler) = connected(r#"{"Empty": {"columns": ["a", "b"], "rows": []}}"#);

        let result = handler.select_all("Empty").unwrap();
        assert_eq!(result.columns, vec!["a", "b"]);
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn test_table_names_with_spaces() {
        let (_dir, mut handler) =
            connected(r#"{"Order Items": {"columns": ["sku"], "rows": [["A-1"]]}}"#);

        let result = handler.select_all("Order Items").unwrap();
        assert_eq!(result.columns, vec!["sku"]);
        assert_eq!(result.row_count(), 1);

        let rows = handler
            .execute_query("SELECT * FROM \"Order Items\"", &[])
            .unwrap();
        assert_eq!(rows[0].get("sku"), Some(&Value::Text("A-1".into())));
        assert!(matches!(
            handler.execute_query("SELECT * FROM Order Items", &[]),
            Err(DbError::UnsupportedQuery { .. })
        ));
    }

    #[test]
    fn test_lifecycle() {
        let (_dir, path) = write_document(EMPLOYEES);
        let mut handler = MvoHandler::new(&path, LogSink::none());

        assert!(matches!(handler.get_tables(), Err(DbError::NotConnected)));

        handler.connect().unwrap();
        handler.connect().unwrap();
        assert!(handler.is_connected());

        handler.close();
        handler.close();
        assert!(!handler.is_connected());
        assert!(matches!(
            handler.execute_query("SELECT * FROM Employees", &[]),
            Err(DbError::NotConnected)
        ));
    }

    #[test]
    fn test_connect_failures_leave_handler_unconnected() {
        let dir = tempfile::tempdir().unwrap();
        let mut missing = MvoHandler::new(dir.path().join("absent.mvo"), LogSink::none());
        assert!(missing.connect().unwrap_err().is_connection_error());
        assert!(!missing.is_connected());

        let (_dir, path) = write_document("{ not json");
        let mut corrupt = MvoHandler::new(&path, LogSink::none());
        assert!(matches!(
            corrupt.connect(),
            Err(DbError::CorruptDatabase { .. })
        ));
        assert!(!corrupt.is_connected());
    }

    #[test]
    fn test_failed_reconnect_drops_previous_document() {
        let (_dir, path) = write_document(EMPLOYEES);
        let mut handler = MvoHandler::new(&path, LogSink::none());
        handler.connect().unwrap();

        std::fs::write(&path, "[]").unwrap();
        assert!(handler.connect().is_err());
        assert!(!handler.is_connected());
    }

    #[test]
    fn test_events_go_to_supplied_sink() {
        let logs = CapturedLogs::default();
        let (_dir, path) = write_document(EMPLOYEES);
        let mut handler = MvoHandler::new(&path, logs.sink());

        handler.connect().unwrap();
        handler.execute_query("SELECT * FROM Employees", &[]).unwrap();
        handler.close();

        let output = logs.contents();
        assert!(output.contains("loaded MVO database"));
        assert!(output.contains("executed MVO query"));
        assert!(output.contains("closed MVO database"));
    }
}
