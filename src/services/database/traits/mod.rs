//! Handler abstraction traits and types.
//!
//! This module provides a unified interface over every supported backend.
//! It defines:
//!
//! - **Types** (`types`): Backend kind enum, connection records and descriptors
//! - **Row/Value** (`row`): Backend-agnostic value and row representation
//! - **Handler** (`handler`): The `DatabaseHandler` contract
//!
//! # Example
//!
//! ```ignore
//! use dbrowser::services::database::traits::{ConnectionDescriptor, ConnectionRecord};
//!
//! let descriptor = ConnectionDescriptor::Record(ConnectionRecord::new(
//!     "postgresql",
//!     "localhost",
//!     "user",
//!     "password",
//!     "mydb",
//! ));
//! ```

pub mod handler;
pub mod row;
pub mod types;

pub use handler::{BoxedHandler, DatabaseHandler};

pub use row::{Cell, QueryResult, Row, Value};

pub use types::{BackendKind, ConnectionDescriptor, ConnectionRecord, ValidatedRecord};
