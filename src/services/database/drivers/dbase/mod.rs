//! dBase driver implementation.
//!
//! Reads dBase III/IV `.dbf` tables (also accepted under the `.db3`
//! extension) without any external library, and writes dBase III files for
//! sample data.

mod connection;
mod format;

use std::path::Path;

use chrono::NaiveDate;

pub use connection::DbaseHandler;
pub use format::{
    DbfTable, FieldDescriptor, FieldKind, encode_table, parse_table, read_table, write_table,
};

use crate::services::database::error::Result;
use crate::services::database::traits::Value;

/// Write the sample Employees table to `path`.
pub fn create_sample_database(path: &Path) -> Result<()> {
    let fields = vec![
        FieldDescriptor::numeric("empid", 4, 0),
        FieldDescriptor::character("firstname", 50),
        FieldDescriptor::character("lastname", 50),
        FieldDescriptor::character("position", 50),
        FieldDescriptor::numeric("salary", 10, 2),
        FieldDescriptor::date("hiredate"),
    ];

    let employees = [
        (1, "John", "Doe", "Manager", 75000.0, (2022, 1, 15)),
        (2, "Jane", "Smith", "Developer", 65000.0, (2022, 3, 20)),
        (3, "Bob", "Johnson", "Analyst", 60000.0, (2022, 5, 10)),
        (4, "Alice", "Williams", "Designer", 62000.0, (2022, 7, 5)),
        (5, "Charlie", "Brown", "Tester", 58000.0, (2022, 9, 12)),
    ];

    let rows: Vec<Vec<Value>> = employees
        .into_iter()
        .map(|(id, first, last, position, salary, (y, m, d))| {
            vec![
                Value::Integer(id),
                first.into(),
                last.into(),
                position.into(),
                Value::Float(salary),
                NaiveDate::from_ymd_opt(y, m, d).into(),
            ]
        })
        .collect();

    write_table(path, &fields, &rows)?;
    tracing::info!(path = %path.display(), "created sample dBase table");
    Ok(())
}
