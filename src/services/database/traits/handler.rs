//! The handler contract every backend implements.

use std::path::Path;

use super::row::{QueryResult, Row, Value};
use super::types::BackendKind;
use crate::services::database::error::{DbError, Result};
use crate::services::database::export;
use crate::services::database::logging::LogSink;

/// Core trait for all backend handlers.
///
/// A handler is constructed unconnected, becomes usable after a successful
/// [`connect`](DatabaseHandler::connect), and is released by
/// [`close`](DatabaseHandler::close). Every operation blocks until the
/// underlying driver call finishes.
///
/// # Example
///
/// ```ignore
/// use dbrowser::{ConnectionDescriptor, HandlerFactory};
///
/// let mut handler = HandlerFactory::resolve(ConnectionDescriptor::parse("sample.mvo")?)?;
/// handler.connect()?;
/// for table in handler.get_tables()? {
///     let rows = handler.execute_query(&format!("SELECT * FROM {table}"), &[])?;
///     println!("{table}: {} rows", rows.len());
/// }
/// handler.close();
/// ```
pub trait DatabaseHandler: Send {
    /// Get the backend kind for this handler
    fn kind(&self) -> BackendKind;

    /// Human-readable target: a file path or `user@host/database`.
    fn display_name(&self) -> String;

    /// Sink that receives this handler's log events.
    fn log_sink(&self) -> &LogSink;

    /// Check whether a native connection is currently held.
    fn is_connected(&self) -> bool;

    /// Establish the native connection.
    ///
    /// Any connection already held is released first. On failure the handler
    /// is left unconnected.
    ///
    /// # Errors
    ///
    /// Returns a connection error for missing files, refused or unreachable
    /// servers, bad credentials, missing required parameters, or a backend
    /// whose native driver is unavailable. Returns `CorruptDatabase` when an
    /// embedded file exists but cannot be parsed.
    fn connect(&mut self) -> Result<()>;

    /// List user tables in backend discovery order.
    fn get_tables(&mut self) -> Result<Vec<String>>;

    /// Execute a backend-native query and materialize every row.
    ///
    /// # Arguments
    ///
    /// * `query` - SQL text, or `SELECT * FROM <table>` for embedded engines
    /// * `params` - Positional parameters bound into the query
    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Fetch every column and row of `table`, keeping the column list even
    /// when the table is empty.
    fn select_all(&mut self, table: &str) -> Result<QueryResult>;

    /// Release the native connection. Calling this on an unconnected or
    /// already closed handler does nothing.
    fn close(&mut self);

    /// Export a whole table as CSV.
    ///
    /// Returns the number of data rows written.
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the table is not listed by
    /// [`get_tables`](DatabaseHandler::get_tables) and `Io` if the destination
    /// cannot be written.
    fn export_to_csv(&mut self, table: &str, output_path: &Path) -> Result<usize> {
        let sink = self.log_sink().clone();
        sink.scope(|| {
            let tables = self.get_tables()?;
            if !tables.iter().any(|t| t == table) {
                tracing::warn!(table, "export requested for unknown table");
                return Err(DbError::table_not_found(table));
            }

            let result = self.select_all(table)?;
            let written = export::write_csv(output_path, &result)?;
            tracing::info!(
                table,
                rows = written,
                path = %output_path.display(),
                "exported table to CSV"
            );
            Ok(written)
        })
    }
}

/// A boxed handler trait object, as produced by the factory.
pub type BoxedHandler = Box<dyn DatabaseHandler>;
