//! Cursor over an in-memory MVO database.
//!
//! The cursor does no I/O: a successful `execute` selects a table that is
//! already materialized and the fetch methods walk it with a read position.
//!
//! ```text
//! Idle --execute--> Executed --position reaches end--> Exhausted
//!                      ^                                |
//!                      +------------execute-------------+
//! ```

use super::document::{EmbeddedDatabase, Table};
use super::query::parse_select_all;
use crate::services::database::error::{DbError, Result};
use crate::services::database::traits::Row;

/// Observable cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No query has run yet.
    Idle,
    /// A query ran and rows may remain.
    Executed,
    /// The read position is at the end of the result.
    Exhausted,
}

#[derive(Debug)]
struct ActiveResult<'db> {
    table: &'db Table,
    position: usize,
}

/// Execution state over one borrowed [`EmbeddedDatabase`].
#[derive(Debug)]
pub struct Cursor<'db> {
    database: &'db EmbeddedDatabase,
    active: Option<ActiveResult<'db>>,
}

impl<'db> Cursor<'db> {
    pub fn new(database: &'db EmbeddedDatabase) -> Self {
        Self {
            database,
            active: None,
        }
    }

    /// Run a `SELECT * FROM <table>` query.
    ///
    /// Resets the read position to zero. On failure the previous result, if
    /// any, is left untouched.
    pub fn execute(&mut self, query: &str) -> Result<&mut Self> {
        let select = parse_select_all(query)?;
        self.select_table(&select.table)?;
        Ok(self)
    }

    /// Select every row of `table` without going through the query grammar.
    pub fn select_table(&mut self, table: &str) -> Result<&mut Self> {
        let table = self
            .database
            .table(table)
            .ok_or_else(|| DbError::table_not_found(table))?;

        self.active = Some(ActiveResult {
            table,
            position: 0,
        });
        Ok(self)
    }

    pub fn state(&self) -> CursorState {
        match &self.active {
            None => CursorState::Idle,
            Some(active) if active.position >= active.table.rows().len() => {
                CursorState::Exhausted
            }
            Some(_) => CursorState::Executed,
        }
    }

    /// Column names of the current result, taken from the table schema so
    /// they are known even when the table has no rows.
    pub fn description(&self) -> Option<&'db [String]> {
        self.active.as_ref().map(|a| a.table).map(Table::columns)
    }

    pub fn current_table(&self) -> Option<&'db str> {
        self.active.as_ref().map(|a| a.table).map(Table::name)
    }

    /// Total rows in the current result.
    pub fn row_count(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.table.rows().len())
    }

    /// Fetch the next row, or `None` once every row has been read.
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        let active = self.active.as_mut().ok_or(DbError::NoActiveQuery)?;
        let table = active.table;

        let Some(values) = table.rows().get(active.position) else {
            return Ok(None);
        };
        active.position += 1;
        Ok(Some(Row::from_parts(table.columns(), values.clone())))
    }

    /// Fetch every remaining row and move the position to the end.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let active = self.active.as_mut().ok_or(DbError::NoActiveQuery)?;
        let table = active.table;

        let rows = table.rows()[active.position..]
            .iter()
            .map(|values| Row::from_parts(table.columns(), values.clone()))
            .collect();

        active.position = table.rows().len();
        Ok(rows)
    }
}
