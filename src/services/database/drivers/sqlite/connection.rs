//! SQLite handler implementation.
//!
//! This module implements the `DatabaseHandler` trait for SQLite files using a
//! single SQLx connection driven to completion on the calling thread.

use std::path::{Path, PathBuf};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Column, Connection, Executor, Sqlite, SqliteConnection, Statement};

use super::types::SqliteValueConverter;
use crate::services::database::drivers::sql::{bind_values, classify_error, quote_identifier};
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, DatabaseHandler, QueryResult, Row, Value,
};

const LIST_TABLES_QUERY: &str = r#"
    SELECT name
    FROM sqlite_master
    WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
    ORDER BY name
"#;

/// SQLite database handler.
///
/// The file must already exist; connecting never creates a database.
pub struct SqliteHandler {
    path: PathBuf,
    sink: LogSink,
    conn: Option<SqliteConnection>,
}

impl std::fmt::Debug for SqliteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteHandler")
            .field("path", &self.path)
            .field("conn", &self.conn.as_ref().map(|_| "<SqliteConnection>"))
            .finish()
    }
}

impl SqliteHandler {
    /// Create a new SQLite handler for `path`.
    ///
    /// This does not connect immediately - call `connect()` to open the file.
    pub fn new(path: impl Into<PathBuf>, sink: LogSink) -> Self {
        Self {
            path: path.into(),
            sink,
            conn: None,
        }
    }

    /// Create a boxed handler (for factory use).
    pub fn boxed(path: impl Into<PathBuf>, sink: LogSink) -> BoxedHandler {
        Box::new(Self::new(path, sink))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build_connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(false)
            .foreign_keys(true)
    }

    fn conn_mut(&mut self) -> Result<&mut SqliteConnection> {
        self.conn.as_mut().ok_or(DbError::NotConnected)
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = smol::block_on(conn.close()) {
                tracing::warn!(error = %e, "error while closing SQLite connection");
            }
            tracing::info!(path = %self.path.display(), "closed SQLite database");
        }
    }
}

impl DatabaseHandler for SqliteHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::SQLite
    }

    fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    fn log_sink(&self) -> &LogSink {
        &self.sink
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connect(&mut self) -> Result<()> {
        let sink = self.sink.clone();
        sink.scope(|| {
            self.release();

            if !self.path.is_file() {
                tracing::error!(path = %self.path.display(), "SQLite file not found");
                return Err(DbError::connection(format!(
                    "SQLite database not found: {}",
                    self.path.display()
                )));
            }

            let options = self.build_connect_options();
            let path = self.path.clone();
            let conn = smol::block_on(async move {
                let mut conn = SqliteConnection::connect_with(&options)
                    .await
                    .map_err(|e| {
                        DbError::connection(format!(
                            "cannot open SQLite database {}: {e}",
                            path.display()
                        ))
                    })?;

                // SQLite opens lazily; read the catalog to reject non-database files.
                sqlx::query::<Sqlite>("SELECT count(*) FROM sqlite_master")
                    .fetch_one(&mut conn)
                    .await
                    .map_err(|e| DbError::corrupt(&path, e.to_string()))?;

                Ok::<_, DbError>(conn)
            })?;

            self.conn = Some(conn);
            tracing::info!(path = %self.path.display(), "connected to SQLite database");
            Ok(())
        })
    }

    fn get_tables(&mut self) -> Result<Vec<String>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let conn = self.conn_mut()?;
            let rows = smol::block_on(
                sqlx::query_scalar::<Sqlite, String>(LIST_TABLES_QUERY).fetch_all(conn),
            )
            .map_err(|e| classify_error(LIST_TABLES_QUERY, e))?;

            tracing::debug!(count = rows.len(), "listed SQLite tables");
            Ok(rows)
        })
    }

    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let conn = self.conn_mut()?;
            let sqlite_rows =
                smol::block_on(bind_values(sqlx::query::<Sqlite>(query), params).fetch_all(conn))
                    .map_err(|e| {
                        tracing::warn!(query, error = %e, "SQLite query failed");
                        classify_error(query, e)
                    })?;

            let rows: Vec<Row> = sqlite_rows
                .iter()
                .map(SqliteValueConverter::convert_row)
                .collect();
            tracing::debug!(query, rows = rows.len(), "executed SQLite query");
            Ok(rows)
        })
    }

    fn select_all(&mut self, table: &str) -> Result<QueryResult> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let sql = format!("SELECT * FROM {}", quote_identifier(table, '"'));
            let conn = self.conn_mut()?;

            let (columns, sqlite_rows) = smol::block_on(async {
                let statement = (&mut *conn).prepare(&sql).await?;
                let columns: Vec<String> = statement
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                let rows = sqlx::query::<Sqlite>(&sql).fetch_all(&mut *conn).await?;
                Ok::<_, sqlx::Error>((columns, rows))
            })
            .map_err(|e| classify_error(&sql, e))?;

            let rows = sqlite_rows
                .iter()
                .map(SqliteValueConverter::convert_row)
                .collect();
            Ok(QueryResult::new(columns, rows))
        })
    }

    fn close(&mut self) {
        let sink = self.sink.clone();
        sink.scope(|| self.release());
    }
}

impl Drop for SqliteHandler {
    fn drop(&mut self) {
        self.close();
    }
}
