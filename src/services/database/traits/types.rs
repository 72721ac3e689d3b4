//! Backend kinds and connection descriptors.
//!
//! This module contains:
//! - `BackendKind` - The closed set of supported backends
//! - `ConnectionRecord` - Structured parameters for networked backends
//! - `ConnectionDescriptor` - A file path or a connection record

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::services::database::error::{DbError, Result};

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded SQLite file (`.db`)
    SQLite,
    /// dBase table file (`.dbf`, `.db3`)
    DBase,
    /// Microsoft Access file (`.mdb`, `.accdb`) through ODBC
    Access,
    /// Embedded MVO document (`.mvo`)
    Mvo,
    MySQL,
    PostgreSQL,
}

impl BackendKind {
    /// Get the display name for this backend
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SQLite => "SQLite",
            Self::DBase => "dBase",
            Self::Access => "Microsoft Access",
            Self::Mvo => "MVO",
            Self::MySQL => "MySQL",
            Self::PostgreSQL => "PostgreSQL",
        }
    }

    /// Get the default port for server-based backends
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySQL => Some(3306),
            Self::PostgreSQL => Some(5432),
            Self::SQLite | Self::DBase | Self::Access | Self::Mvo => None,
        }
    }

    /// Check if this backend is opened from a local file
    pub fn is_file_based(&self) -> bool {
        self.default_port().is_none()
    }

    /// Get all backend kinds
    pub fn all() -> Vec<BackendKind> {
        vec![
            Self::SQLite,
            Self::DBase,
            Self::Access,
            Self::Mvo,
            Self::MySQL,
            Self::PostgreSQL,
        ]
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Connection parameters for a networked backend.
///
/// Every field except `kind` is optional here; `connect` reports the first
/// missing one by name before touching the network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Backend discriminator, e.g. `mysql` or `postgresql`
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl ConnectionRecord {
    pub fn new(
        kind: impl Into<String>,
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            kind: Some(kind.into()),
            host: Some(host.into()),
            port: None,
            user: Some(user.into()),
            password: Some(password.into()),
            database: Some(database.into()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Check the required fields in declaration order.
    pub fn validate(&self) -> Result<ValidatedRecord<'_>> {
        let host = self.host.as_deref().ok_or(DbError::MissingParameter("host"))?;
        let user = self.user.as_deref().ok_or(DbError::MissingParameter("user"))?;
        let password = self
            .password
            .as_deref()
            .ok_or(DbError::MissingParameter("password"))?;
        let database = self
            .database
            .as_deref()
            .ok_or(DbError::MissingParameter("database"))?;

        Ok(ValidatedRecord {
            host,
            port: self.port,
            user,
            password,
            database,
        })
    }

    /// `user@host:port/database`, never including the password
    pub fn display_name(&self) -> String {
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!(
            "{}@{}{}/{}",
            self.user.as_deref().unwrap_or("?"),
            self.host.as_deref().unwrap_or("?"),
            port,
            self.database.as_deref().unwrap_or("?"),
        )
    }
}

/// Borrowed view of a record whose required fields are all present.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRecord<'a> {
    pub host: &'a str,
    pub port: Option<u16>,
    pub user: &'a str,
    pub password: &'a str,
    pub database: &'a str,
}

/// What a handler is constructed from: a file path or a connection record.
#[derive(Debug, Clone)]
pub enum ConnectionDescriptor {
    Path(PathBuf),
    Record(ConnectionRecord),
}

impl ConnectionDescriptor {
    /// Build a descriptor from the two optional inputs a caller may hold.
    ///
    /// Exactly one must be supplied.
    pub fn from_parts(path: Option<PathBuf>, record: Option<ConnectionRecord>) -> Result<Self> {
        match (path, record) {
            (Some(path), None) => Ok(Self::Path(path)),
            (None, Some(record)) => Ok(Self::Record(record)),
            (Some(_), Some(_)) => Err(DbError::UnsupportedBackend(
                "both a path and a connection record were supplied".to_string(),
            )),
            (None, None) => Err(DbError::UnsupportedBackend(
                "neither a path nor a connection record was supplied".to_string(),
            )),
        }
    }

    /// Parse a command-line style argument.
    ///
    /// Text starting with `{` is read as a JSON connection record; anything
    /// else is a path.
    pub fn parse(arg: &str) -> Result<Self> {
        let trimmed = arg.trim_start();
        if trimmed.starts_with('{') {
            let record: ConnectionRecord = serde_json::from_str(trimmed).map_err(|e| {
                DbError::UnsupportedBackend(format!("invalid connection record: {e}"))
            })?;
            Ok(Self::Record(record))
        } else {
            Ok(Self::Path(PathBuf::from(arg)))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Record(_) => None,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Record(record) => record.display_name(),
        }
    }
}

impl From<PathBuf> for ConnectionDescriptor {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ConnectionDescriptor {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<ConnectionRecord> for ConnectionDescriptor {
    fn from(record: ConnectionRecord) -> Self {
        Self::Record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_default_ports() {
        assert_eq!(BackendKind::PostgreSQL.default_port(), Some(5432));
        assert_eq!(BackendKind::MySQL.default_port(), Some(3306));
        assert_eq!(BackendKind::SQLite.default_port(), None);
        assert!(BackendKind::Mvo.is_file_based());
        assert!(!BackendKind::MySQL.is_file_based());
        assert_eq!(BackendKind::all().len(), 6);
    }

    #[test]
    fn test_record_validation_names_missing_field() {
        let mut record = ConnectionRecord::new("mysql", "localhost", "root", "secret", "shop");
        assert!(record.validate().is_ok());

        record.database = None;
        match record.validate() {
            Err(DbError::MissingParameter(field)) => assert_eq!(field, "database"),
            other => panic!("expected missing database, got {other:?}"),
        }

        record.host = None;
        match record.validate() {
            Err(DbError::MissingParameter(field)) => assert_eq!(field, "host"),
            other => panic!("expected missing host, got {other:?}"),
        }
    }

    #[test]
    fn test_record_deserialization_accepts_type_alias() {
        let record: ConnectionRecord = serde_json::from_str(
            r#"{"type": "MySQL", "host": "db", "user": "u", "password": "p", "database": "d"}"#,
        )
        .unwrap();
        assert_eq!(record.kind.as_deref(), Some("MySQL"));
        assert_eq!(record.display_name(), "u@db/d");

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"p\""));
    }

    #[test]
    fn test_descriptor_from_parts() {
        let path = PathBuf::from("/tmp/a.mvo");
        let record = ConnectionRecord::default();

        assert!(matches!(
            ConnectionDescriptor::from_parts(Some(path.clone()), None),
            Ok(ConnectionDescriptor::Path(_))
        ));
        assert!(matches!(
            ConnectionDescriptor::from_parts(None, Some(record.clone())),
            Ok(ConnectionDescriptor::Record(_))
        ));
        assert!(matches!(
            ConnectionDescriptor::from_parts(Some(path), Some(record)),
            Err(DbError::UnsupportedBackend(_))
        ));
        assert!(matches!(
            ConnectionDescriptor::from_parts(None, None),
            Err(DbError::UnsupportedBackend(_))
        ));
    }

    #[test]
    fn test_descriptor_parse() {
        let desc = ConnectionDescriptor::parse("data/sample.mvo").unwrap();
        assert_eq!(desc.path(), Some(Path::new("data/sample.mvo")));

        let desc = ConnectionDescriptor::parse(r#"{"kind": "postgresql", "host": "h"}"#).unwrap();
        assert!(matches!(desc, ConnectionDescriptor::Record(_)));

        assert!(ConnectionDescriptor::parse("{not json").is_err());
    }
}
