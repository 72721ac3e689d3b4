//! SQLite database driver implementation.
//!
//! This module provides a SQLite handler that implements the `DatabaseHandler`
//! trait using SQLx.
//!
//! Only existing `.db` files are opened; the handler never creates a database.
//! [`create_sample_database`] builds the demonstration file used by the demo
//! binary and the tests.
//!
//! # Example
//!
//! ```ignore
//! use dbrowser::services::database::drivers::sqlite::SqliteHandler;
//! use dbrowser::services::database::logging::LogSink;
//!
//! let mut handler = SqliteHandler::new("/path/to/sample.db", LogSink::none());
//! handler.connect()?;
//! let tables = handler.get_tables()?;
//! ```

mod connection;
mod types;

use std::path::Path;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, Sqlite, SqliteConnection};

pub use connection::SqliteHandler;

use crate::services::database::error::{DbError, Result};

const SAMPLE_SCHEMA: [&str; 2] = [
    "CREATE TABLE Employees (
        EmployeeID INTEGER PRIMARY KEY,
        FirstName TEXT,
        LastName TEXT,
        Department TEXT,
        Salary REAL
    )",
    "CREATE TABLE Departments (
        DepartmentID INTEGER PRIMARY KEY,
        DepartmentName TEXT,
        Location TEXT
    )",
];

const SAMPLE_EMPLOYEES: [(i64, &str, &str, &str, f64); 5] = [
    (1, "John", "Doe", "IT", 75000.0),
    (2, "Jane", "Smith", "HR", 65000.0),
    (3, "Bob", "Johnson", "Finance", 80000.0),
    (4, "Alice", "Williams", "IT", 72000.0),
    (5, "Charlie", "Brown", "HR", 62000.0),
];

const SAMPLE_DEPARTMENTS: [(i64, &str, &str); 3] = [
    (1, "IT", "Building A - Floor 2"),
    (2, "HR", "Building B - Floor 1"),
    (3, "Finance", "Building A - Floor 3"),
];

/// Create a SQLite file at `path` holding the sample Employees and
/// Departments tables.
///
/// Fails if the file already contains either table.
pub fn create_sample_database(path: &Path) -> Result<()> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    smol::block_on(async {
        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| {
                DbError::connection(format!(
                    "cannot create SQLite database {}: {e}",
                    path.display()
                ))
            })?;

        let mut tx = conn
            .begin()
            .await
            .map_err(|e| DbError::io(path, std::io::Error::other(e)))?;

        for statement in SAMPLE_SCHEMA {
            sqlx::query::<Sqlite>(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Query {
                    query: statement.to_string(),
                    message: e.to_string(),
                })?;
        }

        let insert_employee = "INSERT INTO Employees (EmployeeID, FirstName, LastName, Department, Salary) VALUES (?, ?, ?, ?, ?)";
        for (id, first, last, department, salary) in SAMPLE_EMPLOYEES {
            sqlx::query::<Sqlite>(insert_employee)
                .bind(id)
                .bind(first)
                .bind(last)
                .bind(department)
                .bind(salary)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Query {
                    query: insert_employee.to_string(),
                    message: e.to_string(),
                })?;
        }

        let insert_department =
            "INSERT INTO Departments (DepartmentID, DepartmentName, Location) VALUES (?, ?, ?)";
        for (id, name, location) in SAMPLE_DEPARTMENTS {
            sqlx::query::<Sqlite>(insert_department)
                .bind(id)
                .bind(name)
                .bind(location)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Query {
                    query: insert_department.to_string(),
                    message: e.to_string(),
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::io(path, std::io::Error::other(e)))?;
        conn.close()
            .await
            .map_err(|e| DbError::io(path, std::io::Error::other(e)))?;

        tracing::info!(path = %path.display(), "created sample SQLite database");
        Ok(())
    })
}
