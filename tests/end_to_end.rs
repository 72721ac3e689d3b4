//! Factory to export flow across the embedded backends.

use std::path::Path;

use dbrowser::services::database::drivers::{dbase, mvo, sqlite};
use dbrowser::{BackendKind, ConnectionDescriptor, DbError, HandlerFactory, Value};

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let records = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, records)
}

#[test]
fn mvo_browse_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("company.mvo");
    mvo::create_sample_database(&path).unwrap();

    let mut handler = HandlerFactory::resolve(ConnectionDescriptor::from(path.as_path())).unwrap();
    assert_eq!(handler.kind(), BackendKind::Mvo);
    handler.connect().unwrap();

    assert_eq!(handler.get_tables().unwrap(), vec!["Employees", "Departments"]);

    let rows = handler.execute_query("SELECT * FROM Employees", &[]).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].get("FirstName"), Some(&Value::Text("John".into())));
    assert_eq!(rows[4].get("LastName"), Some(&Value::Text("Brown".into())));

    let output = dir.path().join("Employees_export.csv");
    assert_eq!(handler.export_to_csv("Employees", &output).unwrap(), 5);

    let (headers, records) = read_csv(&output);
    assert_eq!(
        headers,
        vec!["EmployeeID", "FirstName", "LastName", "Department", "Salary"]
    );
    assert_eq!(records.len(), 5);
    assert_eq!(records[1][..4], ["2", "Jane", "Smith", "HR"]);
    assert_eq!(records[1][4].parse::<f64>().unwrap(), 65000.0);

    handler.close();
    assert!(!handler.is_connected());
}

#[test]
fn dbase_browse_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staff.dbf");
    dbase::create_sample_database(&path).unwrap();

    let mut handler = HandlerFactory::resolve(ConnectionDescriptor::from(path.as_path())).unwrap();
    assert_eq!(handler.kind(), BackendKind::DBase);
    handler.connect().unwrap();

    assert_eq!(handler.get_tables().unwrap(), vec!["staff"]);

    let output = dir.path().join("staff_export.csv");
    assert_eq!(handler.export_to_csv("staff", &output).unwrap(), 5);

    let (headers, records) = read_csv(&output);
    assert_eq!(
        headers,
        vec!["empid", "firstname", "lastname", "position", "salary", "hiredate"]
    );
    assert_eq!(records[0][1], "John");
    assert_eq!(records[0][3], "Manager");
    assert_eq!(records[0][4].parse::<f64>().unwrap(), 75000.0);
    assert_eq!(records[0][5], "2022-01-15");

    handler.close();
}

#[test]
fn sqlite_browse_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("company.db");
    sqlite::create_sample_database(&path).unwrap();

    let arg = path.to_string_lossy().into_owned();
    let mut handler = HandlerFactory::resolve(ConnectionDescriptor::parse(&arg).unwrap()).unwrap();
    assert_eq!(handler.kind(), BackendKind::SQLite);
    handler.connect().unwrap();

    assert_eq!(handler.get_tables().unwrap(), vec!["Departments", "Employees"]);

    let rows = handler
        .execute_query(
            "SELECT FirstName FROM Employees WHERE Salary > ? ORDER BY EmployeeID",
            &[Value::Float(70000.0)],
        )
        .unwrap();
    let names: Vec<_> = rows
        .iter()
        .filter_map(|r| r.get("FirstName").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["John", "Bob", "Alice"]);

    let output = dir.path().join("Departments_export.csv");
    assert_eq!(handler.export_to_csv("Departments", &output).unwrap(), 3);

    let (headers, records) = read_csv(&output);
    assert_eq!(headers, vec!["DepartmentID", "DepartmentName", "Location"]);
    assert_eq!(records[2], vec!["3", "Finance", "Building A - Floor 3"]);

    handler.close();
}

#[test]
fn export_of_unknown_table_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("company.mvo");
    mvo::create_sample_database(&path).unwrap();

    let mut handler = HandlerFactory::resolve(ConnectionDescriptor::from(path.as_path())).unwrap();
    handler.connect().unwrap();

    let output = dir.path().join("Projects_export.csv");
    assert!(matches!(
        handler.export_to_csv("Projects", &output),
        Err(DbError::Schema { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn unsupported_file_is_rejected_before_io() {
    let result = HandlerFactory::resolve(ConnectionDescriptor::parse("notes.txt").unwrap());
    assert!(matches!(result, Err(DbError::UnsupportedBackend(_))));
}
