//! Error types for the database access layer.
//!
//! Every handler operation returns [`DbError`] on failure. Each variant carries
//! enough context (path, table, query text, driver message) to diagnose the
//! failure without retrying.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving, connecting to, or querying a backend.
#[derive(Debug, Error)]
pub enum DbError {
    /// The backing store could not be located or the connection was refused.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// A networked connection record lacks a required field.
    #[error("connection error: missing required connection parameter: {0}")]
    MissingParameter(&'static str),

    /// The embedded database file could not be parsed.
    #[error("corrupt database {}: {message}", path.display())]
    CorruptDatabase { path: PathBuf, message: String },

    /// A referenced table or column does not exist.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// The query has a shape the engine cannot execute.
    #[error("unsupported query `{query}`: {reason}")]
    UnsupportedQuery { query: String, reason: String },

    /// The native driver rejected the query.
    #[error("query failed: {message} (query: `{query}`)")]
    Query { query: String, message: String },

    /// A fetch was attempted on a cursor that has not executed a query.
    #[error("no query has been executed on this cursor")]
    NoActiveQuery,

    /// A data operation was invoked outside the connected state.
    #[error("database not connected")]
    NotConnected,

    /// The factory could not map the descriptor to a backend.
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// Writing an export destination failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DbError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn table_not_found(table: &str) -> Self {
        Self::Schema {
            message: format!("table '{table}' not found"),
        }
    }

    pub fn unsupported_query(query: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedQuery {
            query: query.to_string(),
            reason: reason.into(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptDatabase {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures raised while establishing a connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::MissingParameter(_))
    }
}

/// Result alias used throughout the access layer.
pub type Result<T> = std::result::Result<T, DbError>;
