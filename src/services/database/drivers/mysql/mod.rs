//! MySQL database driver implementation.
//!
//! This module provides a MySQL/MariaDB handler that implements the
//! `DatabaseHandler` trait using SQLx.
//!
//! # Example
//!
//! ```ignore
//! use dbrowser::services::database::drivers::mysql::MySqlHandler;
//! use dbrowser::services::database::logging::LogSink;
//! use dbrowser::services::database::traits::ConnectionRecord;
//!
//! let record = ConnectionRecord::new("mysql", "localhost", "root", "password", "mydb");
//! let mut handler = MySqlHandler::new(record, LogSink::none());
//! handler.connect()?;
//! ```

mod connection;
mod types;

pub use connection::MySqlHandler;
