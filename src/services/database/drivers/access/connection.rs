//! Microsoft Access handler implementation.

use std::path::{Path, PathBuf};

use super::Session;
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, DatabaseHandler, QueryResult, Row, Value,
};

/// Access database handler for `.mdb` and `.accdb` files.
pub struct AccessHandler {
    path: PathBuf,
    sink: LogSink,
    session: Option<Session>,
}

impl std::fmt::Debug for AccessHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessHandler")
            .field("path", &self.path)
            .field("connected", &self.session.is_some())
            .finish()
    }
}

impl AccessHandler {
    /// Create a new Access handler for `path`.
    ///
    /// This does not connect immediately - call `connect()` to open the file.
    pub fn new(path: impl Into<PathBuf>, sink: LogSink) -> Self {
        Self {
            path: path.into(),
            sink,
            session: None,
        }
    }

    /// Create a boxed handler (for factory use).
    pub fn boxed(path: impl Into<PathBuf>, sink: LogSink) -> BoxedHandler {
        Box::new(Self::new(path, sink))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(DbError::NotConnected)
    }

    fn release(&mut self) {
        if self.session.take().is_some() {
            tracing::info!(path = %self.path.display(), "closed Access database");
        }
    }
}

impl DatabaseHandler for AccessHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::Access
    }

    fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    fn log_sink(&self) -> &LogSink {
        &self.sink
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn connect(&mut self) -> Result<()> {
        let sink = self.sink.clone();
        sink.scope(|| {
            self.release();

            if !self.path.is_file() {
                tracing::error!(path = %self.path.display(), "Access file not found");
                return Err(DbError::connection(format!(
                    "Access database not found: {}",
                    self.path.display()
                )));
            }

            let session = Session::open(&self.path).inspect_err(|e| {
                tracing::error!(error = %e, "Access connection failed");
            })?;
            self.session = Some(session);
            tracing::info!(path = %self.path.display(), "connected to Access database");
            Ok(())
        })
    }

    fn get_tables(&mut self) -> Result<Vec<String>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let tables = self.session_mut()?.tables()?;
            tracing::debug!(count = tables.len(), "listed Access tables");
            Ok(tables)
        })
    }

    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let result = self
                .session_mut()?
                .query(query, params)
                .inspect_err(|e| tracing::warn!(query, error = %e, "Access query failed"))?;
            tracing::debug!(query, rows = result.row_count(), "executed Access query");
            Ok(result.rows)
        })
    }

    fn select_all(&mut self, table: &str) -> Result<QueryResult> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let escaped = table.replace(']', "]]");
            let sql = format!("SELECT * FROM [{escaped}]");
            self.session_mut()?.query(&sql, &[])
        })
    }

    fn close(&mut self) {
        let sink = self.sink.clone();
        sink.scope(|| self.release());
    }
}
