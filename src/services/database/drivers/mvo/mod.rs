//! MVO driver implementation.
//!
//! Exposes the embedded engine in `services::database::mvo` through the
//! `DatabaseHandler` trait.

mod connection;

use std::path::Path;

pub use connection::MvoHandler;

use crate::services::database::error::Result;
use crate::services::database::mvo::EmbeddedDatabase;
use crate::services::database::traits::Value;

/// The sample Employees and Departments document.
pub fn sample_database() -> Result<EmbeddedDatabase> {
    let mut database = EmbeddedDatabase::new();

    let employees = [
        (1, "John", "Doe", "IT", 75000.0),
        (2, "Jane", "Smith", "HR", 65000.0),
        (3, "Bob", "Johnson", "Finance", 80000.0),
        (4, "Alice", "Williams", "IT", 72000.0),
        (5, "Charlie", "Brown", "HR", 62000.0),
    ];
    database.add_table(
        "Employees",
        ["EmployeeID", "FirstName", "LastName", "Department", "Salary"]
            .map(String::from)
            .to_vec(),
        employees
            .into_iter()
            .map(|(id, first, last, department, salary)| {
                vec![
                    Value::Integer(id),
                    first.into(),
                    last.into(),
                    department.into(),
                    Value::Float(salary),
                ]
            })
            .collect(),
    )?;

    let departments = [
        (1, "IT", "Building A - Floor 2"),
        (2, "HR", "Building B - Floor 1"),
        (3, "Finance", "Building A - Floor 3"),
    ];
    database.add_table(
        "Departments",
        ["DepartmentID", "DepartmentName", "Location"]
            .map(String::from)
            .to_vec(),
        departments
            .into_iter()
            .map(|(id, name, location)| vec![Value::Integer(id), name.into(), location.into()])
            .collect(),
    )?;

    Ok(database)
}

/// Write the sample document to `path`.
pub fn create_sample_database(path: &Path) -> Result<()> {
    sample_database()?.save(path)?;
    tracing::info!(path = %path.display(), "created sample MVO database");
    Ok(())
}
