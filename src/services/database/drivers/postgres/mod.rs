//! PostgreSQL database driver implementation.
//!
//! This module provides a PostgreSQL handler that implements the
//! `DatabaseHandler` trait using SQLx. Records with kind `postgresql` or
//! `postgres` resolve here.
//!
//! # Example
//!
//! ```ignore
//! use dbrowser::services::database::drivers::postgres::PostgresHandler;
//! use dbrowser::services::database::logging::LogSink;
//! use dbrowser::services::database::traits::ConnectionRecord;
//!
//! let record = ConnectionRecord::new("postgresql", "localhost", "user", "password", "mydb")
//!     .with_port(5432);
//! let mut handler = PostgresHandler::new(record, LogSink::none());
//! handler.connect()?;
//! ```

mod connection;
mod types;

pub use connection::PostgresHandler;
