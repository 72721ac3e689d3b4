//! Stand-in session used when the crate is built without the `odbc` feature.

use std::path::Path;

use crate::services::database::error::{DbError, Result};
use crate::services::database::traits::{QueryResult, Value};

/// Uninhabited: opening always fails, so no other method can be reached.
pub enum Session {}

impl Session {
    pub fn open(path: &Path) -> Result<Self> {
        Err(DbError::connection(format!(
            "cannot open Access database {}: ODBC support is not compiled in (enable the `odbc` feature)",
            path.display()
        )))
    }

    pub fn tables(&mut self) -> Result<Vec<String>> {
        match *self {}
    }

    pub fn query(&mut self, _query: &str, _params: &[Value]) -> Result<QueryResult> {
        match *self {}
    }
}
