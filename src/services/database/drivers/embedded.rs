//! Query execution shared by the handlers backed by an in-memory
//! [`EmbeddedDatabase`] (MVO and dBase).

use crate::services::database::error::{DbError, Result};
use crate::services::database::mvo::{Cursor, EmbeddedDatabase};
use crate::services::database::traits::{QueryResult, Row, Value};

/// Run a `SELECT * FROM <table>` query and fetch every row.
pub(crate) fn execute(
    database: &EmbeddedDatabase,
    query: &str,
    params: &[Value],
) -> Result<Vec<Row>> {
    if !params.is_empty() {
        return Err(DbError::unsupported_query(
            query,
            "query parameters are not supported by embedded databases",
        ));
    }

    let mut cursor = Cursor::new(database);
    cursor.execute(query)?;
    cursor.fetch_all()
}

/// Fetch every row of `table` together with its schema columns.
pub(crate) fn select_all(database: &EmbeddedDatabase, table: &str) -> Result<QueryResult> {
    let mut cursor = Cursor::new(database);
    cursor.select_table(table)?;

    let columns = cursor.description().unwrap_or_default().to_vec();
    let rows = cursor.fetch_all()?;
    Ok(QueryResult::new(columns, rows))
}
