//! Database driver implementations.
//!
//! This module contains one handler per backend:
//!
//! - **SQLite**: Embedded SQLite files via SQLx
//! - **MySQL**: MySQL/MariaDB servers via SQLx
//! - **PostgreSQL**: PostgreSQL servers via SQLx
//! - **Access**: Microsoft Access files via ODBC (behind the `odbc` feature)
//! - **dBase**: `.dbf` tables read by a built-in decoder
//! - **MVO**: The embedded JSON document format
//!
//! Each driver implements the `DatabaseHandler` trait. `HandlerFactory` picks
//! the right one for a `ConnectionDescriptor`.

pub mod access;
pub mod dbase;
pub mod mvo;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

mod embedded;
mod factory;
mod sql;

pub use access::AccessHandler;
pub use dbase::DbaseHandler;
pub use factory::HandlerFactory;
pub use mvo::MvoHandler;
pub use mysql::MySqlHandler;
pub use postgres::PostgresHandler;
pub use sqlite::SqliteHandler;
