//! PostgreSQL handler implementation.
//!
//! This module implements the `DatabaseHandler` trait for PostgreSQL using a
//! single SQLx connection. Tables are listed from the `public` schema.

use sqlx::postgres::PgConnectOptions;
use sqlx::{Column, Connection, Executor, PgConnection, Postgres, Statement};

use super::types::PgValueConverter;
use crate::services::database::drivers::sql::{bind_values, classify_error, quote_identifier};
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, ConnectionRecord, DatabaseHandler, QueryResult, Row, Value,
};

const DEFAULT_PORT: u16 = 5432;

const LIST_TABLES_QUERY: &str = r#"
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
    ORDER BY table_name
"#;

/// PostgreSQL database handler.
pub struct PostgresHandler {
    record: ConnectionRecord,
    sink: LogSink,
    conn: Option<PgConnection>,
}

impl std::fmt::Debug for PostgresHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresHandler")
            .field("target", &self.record.display_name())
            .field("conn", &self.conn.as_ref().map(|_| "<PgConnection>"))
            .finish()
    }
}

impl PostgresHandler {
    /// Create a new PostgreSQL handler from a connection record.
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

    /// Build PgConnectOptions from the record.
    ///
    /// Fails naming the first missing required field.
    fn build_connect_options(&self) -> Result<PgConnectOptions> {
        let record = self.record.validate()?;
        let port = record.port.unwrap_or(DEFAULT_PORT);

        Ok(PgConnectOptions::new()
            .host(record.host)
            .port(port)
            .username(record.user)
            .password(record.password)
            .database(record.database))
    }

    fn conn_mut(&mut self) -> Result<&mut PgConnection> {
        self.conn.as_mut().ok_or(DbError::NotConnected)
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = smol::block_on(conn.close()) {
                tracing::warn!(error = %e, "error while closing PostgreSQL connection");
            }
            tracing::info!(server = %self.record.display_name(), "closed PostgreSQL connection");
        }
    }
}

impl DatabaseHandler for PostgresHandler {
    fn kind(&self) -> BackendKind {
        BackendKind::PostgreSQL
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
                tracing::error!(error = %e, "invalid PostgreSQL connection record");
            })?;

            let server = self.record.display_name();
            let conn = smol::block_on(PgConnection::connect_with(&options)).map_err(|e| {
                tracing::error!(%server, error = %e, "PostgreSQL connection failed");
                DbError::connection(format!("cannot connect to PostgreSQL at {server}: {e}"))
            })?;

            self.conn = Some(conn);
            tracing::info!(%server, "connected to PostgreSQL");
            Ok(())
        })
    }

    fn get_tables(&mut self) -> Result<Vec<String>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let conn = self.conn_mut()?;
            let tables = smol::block_on(
                sqlx::query_scalar::<Postgres, String>(LIST_TABLES_QUERY).fetch_all(conn),
            )
            .map_err(|e| classify_error(LIST_TABLES_QUERY, e))?;

            tracing::debug!(count = tables.len(), "listed PostgreSQL tables");
            Ok(tables)
        })
    }

    fn execute_query(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let conn = self.conn_mut()?;
            let pg_rows =
                smol::block_on(bind_values(sqlx::query::<Postgres>(query), params).fetch_all(conn))
                    .map_err(|e| {
                        tracing::warn!(query, error = %e, "PostgreSQL query failed");
                        classify_error(query, e)
                    })?;

            let rows: Vec<Row> = pg_rows
                .iter()
                .map(PgValueConverter::convert_row)
                .collect();
            tracing::debug!(query, rows = rows.len(), "executed PostgreSQL query");
            Ok(rows)
        })
    }

    fn select_all(&mut self, table: &str) -> Result<QueryResult> {
        let sink = self.sink.clone();
        sink.scope(|| {
            let sql = format!("SELECT * FROM {}", quote_identifier(table, '"'));
            let conn = self.conn_mut()?;

            let (columns, pg_rows) = smol::block_on(async {
                let statement = (&mut *conn).prepare(&sql).await?;
                let columns: Vec<String> = statement
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                let rows = sqlx::query::<Postgres>(&sql).fetch_all(&mut *conn).await?;
                Ok::<_, sqlx::Error>((columns, rows))
            })
            .map_err(|e| classify_error(&sql, e))?;

            let rows = pg_rows
                .iter()
                .map(PgValueConverter::convert_row)
                .collect();
            Ok(QueryResult::new(columns, rows))
        })
    }

    fn close(&mut self) {
        let sink = self.sink.clone();
        sink.scope(|| self.release());
    }
}

impl Drop for PostgresHandler {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_record() -> ConnectionRecord {
        ConnectionRecord::new("postgresql", "localhost", "postgres", "secret", "shop")
    }

    #[test]
    fn test_postgres_handler_new() {
        let handler = PostgresHandler::new(create_record().with_port(5433), LogSink::none());

        assert_eq!(handler.kind(), BackendKind::PostgreSQL);
        assert_eq!(handler.display_name(), "postgres@localhost:5433/shop");
        assert!(!handler.is_connected());
    }

    #[test]
    fn test_default_port_matches_backend_metadata() {
        assert_eq!(BackendKind::PostgreSQL.default_port(), Some(DEFAULT_PORT));
    }

    #[test]
    fn test_build_connect_options() {
        let handler = PostgresHandler::new(create_record(), LogSink::none());
        assert!(handler.build_connect_options().is_ok());
    }

    #[test]
    fn test_missing_database_fails_before_io() {
        let mut record = create_record();
        record.database = None;
        let mut handler = PostgresHandler::new(record, LogSink::none());

        match handler.connect() {
            Err(DbError::MissingParameter(field)) => assert_eq!(field, "database"),
            other => panic!("expected missing database, got {other:?}"),
        }
        assert!(!handler.is_connected());
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let mut record = ConnectionRecord {
            kind: Some("postgres".into()),
            ..Default::default()
        };
        let mut handler = PostgresHandler::new(record.clone(), LogSink::none());
        assert!(matches!(
            handler.connect(),
            Err(DbError::MissingParameter("host"))
        ));

        record.host = Some("localhost".into());
        record.user = Some("postgres".into());
        let mut handler = PostgresHandler::new(record, LogSink::none());
        assert!(matches!(
            handler.connect(),
            Err(DbError::MissingParameter("password"))
        ));
    }

    #[test]
    fn test_operations_require_connection() {
        let mut handler = PostgresHandler::new(create_record(), LogSink::none());

        assert!(matches!(handler.get_tables(), Err(DbError::NotConnected)));
        assert!(matches!(
            handler.execute_query("SELECT 1", &[]),
            Err(DbError::NotConnected)
        ));
        assert!(matches!(handler.select_all("t"), Err(DbError::NotConnected)));

        handler.close();
        handler.close();
    }
}
