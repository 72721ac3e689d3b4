//! dBase handler implementation.
//!
//! A `.dbf` file holds exactly one table, named after the file stem. The file
//! is decoded on `connect` and queried with the embedded `SELECT *` grammar.

use std::path::{Path, PathBuf};

use super::format::read_table;
use crate::services::database::drivers::embedded;
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::mvo::EmbeddedDatabase;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, DatabaseHandler, QueryResult, Row, Value,
};

/// Handler for `.dbf` and `.db3` files.
#[derive(Debug)]
pub struct DbaseHandler {
    path: PathBuf,
    sink: LogSink,
    database: Option<EmbeddedDatabase>,
}

impl DbaseHandler {
    /// Create a new dBase handler for `path`.
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

    /// Name of the single table: the file stem.
    pub fn table_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn load(&self) -> Result<EmbeddedDatabase> {
        let table = read_table(&self.path)?;
        let mut database = EmbeddedDatabase::new();
        database
            .add_table(self.table_name(), table.column_names(), table.rows)
            .map_err(|e| DbError::corrupt(&self.path, e.to_string()))?;
        Ok(database)
    }

    fn loaded(&self) -> Result<&EmbeddedDatabase> {
        self.database.as_ref().ok_or(DbError::NotConnected)
    }

    fn release(&mut self) {
        if self.database.take().is_some() {
            tracing::info!(path = %self.path.display(), "closed dBase file");
        }
    }
}

impl DatabaseHandler for DbaseHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::DBase
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

            let database = self.load().inspect_err(|e| {
                tracing::error!(path = %self.path.display(), error = %e, "cannot load dBase file");
            })?;

            tracing::info!(
                path = %self.path.display(),
                table = %self.table_name(),
                "loaded dBase file"
            );
            self.database = Some(database);
            Ok(())
        })
    }

    fn get_tables(&mut self) -> Result<Vec<String>> {
        self.sink.scope(|| Ok(self.loaded()?.table_names()))
    }

    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.sink.scope(|| {
            let rows = embedded::execute(self.loaded()?, query, params)
                .inspect_err(|e| tracing::warn!(query, error = %e, "dBase query failed"))?;
            tracing::debug!(query, rows = rows.len(), "executed dBase query");
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
