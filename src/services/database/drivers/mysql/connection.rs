//! MySQL handler implementation.
//!
//! This module implements the `DatabaseHandler` trait for MySQL/MariaDB using
//! a single SQLx connection.

use sqlx::mysql::MySqlConnectOptions;
use sqlx::{Column, Connection, Executor, MySql, MySqlConnection, Statement};

use super::types::MySqlValueConverter;
use crate::services::database::drivers::sql::{bind_values, classify_error, quote_identifier};
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, ConnectionRecord, DatabaseHandler, QueryResult, Row, Value,
};

const DEFAULT_PORT: u16 = 3306;

const LIST_TABLES_QUERY: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR)
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

/// MySQL database handler.
pub struct MySqlHandler {
    record: ConnectionRecord,
    sink: LogSink,
    conn: Option<MySqlConnection>,
}

impl std::fmt::Debug for MySqlHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlHandler")
            .field("target", &self.record.display_name())
            .field("conn", &self.conn.as_ref().map(|_| "<MySqlConnection>"))
            .finish()
    }
}

impl MySqlHandler {
    /// Create a new MySQL handler from a connection record.
    ///
    /// This does not connect immediately - call `connect()` to establish the connection.
    pub fn new(record: ConnectionRecord, sink: LogSink) -> Self {
        Self {
            record,
            sink,
            conn: None,
        }
    }

    /// Create a boxed handler (for factory use).
    pub fn boxed(record: ConnectionRecord, sink: LogSink) -> BoxedHandler {
        Box::new(Self::new(record, sink))
    }

    /// Build MySqlConnectOptions from the record.
    ///
    /// Fails naming the first missing required field.
    fn build_connect_options(&self) -> Result<MySqlConnectOptions> {
        let record = self.record.validate()?;
        let port = record.port.unwrap_or(DEFAULT_PORT);

        Ok(MySqlConnectOptions::new()
            .host(record.host)
            .port(port)
            .username(record.user)
            .password(record.password)
            .database(record.database))
    }

    fn conn_mut(&mut self) -> Result<&mut MySqlConnection> {
        self.conn.as_mut().ok_or(DbError::NotConnected)
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = smol::block_on(conn.close()) {
                tracing::warn!(error = %e, "error while closing MySQL connection");
            }
            tracing::info!(server = %self.record.display_name(), "closed MySQL connection");
        }
    }
}

impl DatabaseHandler for MySqlHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::MySQL
    }

    fn display_name(&self) -> String {
        self.record.display_name()
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

            let options = self.build_connect_options().inspect_err(|e| {
                tracing::error!(error = %e, "invalid MySQL connection record");
            })?;

            let server = self.record.display_name();
            let conn = smol::block_on(MySqlConnection::connect_with(&options)).map_err(|e| {
                tracing::error!(%server, error = %e, "MySQL connection failed");
                DbError::connection(format!("cannot connect to MySQL at {server}: {e}"))
            })?;

            self.conn = Some(conn);
            tracing::info!(%server, "connected to MySQL");
            Ok(())
        })
    }

    fn get_tables(&mut self) -> Result<Vec<String>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let conn = self.conn_mut()?;
            let tables = smol::block_on(
                sqlx::query_scalar::<MySql, String>(LIST_TABLES_QUERY).fetch_all(conn),
            )
            .map_err(|e| classify_error(LIST_TABLES_QUERY, e))?;

            tracing::debug!(count = tables.len(), "listed MySQL tables");
            Ok(tables)
        })
    }

    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let conn = self.conn_mut()?;
            let mysql_rows =
                smol::block_on(bind_values(sqlx::query::<MySql>(query), params).fetch_all(conn))
                    .map_err(|e| {
                        tracing::warn!(query, error = %e, "MySQL query failed");
                        classify_error(query, e)
                    })?;

            let rows: Vec<Row> = mysql_rows
                .iter()
                .map(MySqlValueConverter::convert_row)
                .collect();
            tracing::debug!(query, rows = rows.len(), "executed MySQL query");
            Ok(rows)
        })
    }

    fn select_all(&mut self, table: &str) -> Result<QueryResult> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let sql = format!("SELECT * FROM {}", quote_identifier(table, '`'));
            let conn = self.conn_mut()?;

            let (columns, mysql_rows) = smol::block_on(async {
                let statement = (&mut *conn).prepare(&sql).await?;
                let columns: Vec<String> = statement
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                let rows = sqlx::query::<MySql>(&sql).fetch_all(&mut *conn).await?;
                Ok::<_, sqlx::Error>((columns, rows))
            })
            .map_err(|e| classify_error(&sql, e))?;

            let rows = mysql_rows
                .iter()
                .map(MySqlValueConverter::convert_row)
                .collect();
            Ok(QueryResult::new(columns, rows))
        })
    }

    fn close(&mut self) {
        let sink = self.sink.clone();
        sink.scope(|| self.release());
    }
}

impl Drop for MySqlHandler {
    fn drop(&mut self) {
        self.close();
    }
}
