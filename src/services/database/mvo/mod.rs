//! Self-contained embedded database engine.
//!
//! An MVO database is a JSON document loaded into memory in full. The engine
//! provides three pieces that the handlers build on:
//!
//! - **Document** (`document`): loading, validating and writing the file
//! - **Query** (`query`): the `SELECT * FROM <table>` grammar
//! - **Cursor** (`cursor`): execution state and row fetching
//!
//! The query grammar and cursor are also used by the dBase handler, which
//! materializes its single table into an [`EmbeddedDatabase`].

pub mod cursor;
pub mod document;
pub mod query;

pub use cursor::{Cursor, CursorState};
pub use document::{EmbeddedDatabase, FORMAT_VERSION, Table, TableSchema};
pub use query::{SelectAll, parse_select_all};
