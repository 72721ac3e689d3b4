//! Uniform read-only access to heterogeneous databases.
//!
//! A [`ConnectionDescriptor`] (a file path or a connection record) is handed to
//! [`HandlerFactory`], which returns a [`DatabaseHandler`] for the matching
//! backend. Every handler lists tables, runs queries, returns rows as ordered
//! column/value pairs and exports whole tables to CSV.

pub mod services;

pub use services::database::{
    BackendKind, BoxedHandler, ConnectionDescriptor, ConnectionRecord, DatabaseHandler, DbError,
    HandlerFactory, LogSink, QueryResult, Result, Row, Value,
};
