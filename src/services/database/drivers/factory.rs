//! Handler factory for resolving descriptors to database handlers.
//!
//! Resolution is a pure mapping: file paths are matched on their extension,
//! connection records on their `kind`. Nothing is opened until the caller
//! invokes `connect` on the returned handler.

use std::path::Path;

use super::access::AccessHandler;
use super::dbase::DbaseHandler;
use super::mvo::MvoHandler;
use super::mysql::MySqlHandler;
use super::postgres::PostgresHandler;
use super::sqlite::SqliteHandler;
use crate::services::database::error::{DbError, Result};
use crate::services::database::logging::LogSink;
use crate::services::database::traits::{
    BackendKind, BoxedHandler, ConnectionDescriptor, ConnectionRecord,
};

/// File extensions and the backend each one selects. Matching is exact and
/// case-sensitive.
const EXTENSIONS: [(&str, BackendKind); 6] = [
    ("db", BackendKind::SQLite),
    ("dbf", BackendKind::DBase),
    ("db3", BackendKind::DBase),
    ("mdb", BackendKind::Access),
    ("accdb", BackendKind::Access),
    ("mvo", BackendKind::Mvo),
];

/// Factory for creating database handlers from descriptors.
///
/// # Example
///
/// ```ignore
/// use dbrowser::services::database::drivers::HandlerFactory;
/// use dbrowser::services::database::traits::ConnectionDescriptor;
///
/// let mut handler = HandlerFactory::resolve(ConnectionDescriptor::parse("sample.mvo")?)?;
/// handler.connect()?;
/// ```
pub struct HandlerFactory;

impl HandlerFactory {
    /// Resolve a descriptor to an unconnected handler with a silent log sink.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBackend` if the path has no recognized extension or
    /// the record's `kind` is missing or unknown.
    pub fn resolve(descriptor: ConnectionDescriptor) -> Result<BoxedHandler> {
        Self::resolve_with_sink(descriptor, LogSink::none())
    }

    /// Resolve a descriptor to an unconnected handler that logs into `sink`.
    pub fn resolve_with_sink(
        descriptor: ConnectionDescriptor,
        sink: LogSink,
    ) -> Result<BoxedHandler> {
        match descriptor {
            ConnectionDescriptor::Path(path) => match Self::backend_for_path(&path)? {
                BackendKind::SQLite => Ok(SqliteHandler::boxed(path, sink)),
                BackendKind::DBase => Ok(DbaseHandler::boxed(path, sink)),
                BackendKind::Access => Ok(AccessHandler::boxed(path, sink)),
                BackendKind::Mvo => Ok(MvoHandler::boxed(path, sink)),
                kind @ (BackendKind::MySQL | BackendKind::PostgreSQL) => {
                    Err(DbError::UnsupportedBackend(format!(
                        "{kind} cannot be opened from a file path"
                    )))
                }
            },
            ConnectionDescriptor::Record(record) => match Self::backend_for_record(&record)? {
                BackendKind::MySQL => Ok(MySqlHandler::boxed(record, sink)),
                BackendKind::PostgreSQL => Ok(PostgresHandler::boxed(record, sink)),
                kind => Err(DbError::UnsupportedBackend(format!(
                    "{kind} cannot be opened from a connection record"
                ))),
            },
        }
    }

    /// Map a file extension (without the dot) to its backend.
    pub fn backend_for_extension(extension: &str) -> Option<BackendKind> {
        EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, kind)| *kind)
    }

    /// Map a record `kind` to its backend, ignoring case.
    pub fn backend_for_kind(kind: &str) -> Option<BackendKind> {
        match kind.to_ascii_lowercase().as_str() {
            "mysql" => Some(BackendKind::MySQL),
            "postgresql" | "postgres" => Some(BackendKind::PostgreSQL),
            _ => None,
        }
    }

    /// Every recognized file extension, without the dot.
    pub fn supported_extensions() -> Vec<&'static str> {
        EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
    }

    fn backend_for_path(path: &Path) -> Result<BackendKind> {
        let extension = path.extension().and_then(|ext| ext.to_str());
        extension
            .and_then(Self::backend_for_extension)
            .ok_or_else(|| match extension {
                Some(ext) => DbError::UnsupportedBackend(format!(
                    "unrecognized file extension '.{ext}' for {}",
                    path.display()
                )),
                None => DbError::UnsupportedBackend(format!(
                    "{} has no file extension",
                    path.display()
                )),
            })
    }

    fn backend_for_record(record: &ConnectionRecord) -> Result<BackendKind> {
        let kind = record.kind.as_deref().ok_or_else(|| {
            DbError::UnsupportedBackend("connection record has no database kind".to_string())
        })?;
        Self::backend_for_kind(kind).ok_or_else(|| {
            DbError::UnsupportedBackend(format!("unrecognized database kind '{kind}'"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn resolve_path(path: &str) -> Result<BoxedHandler> {
        HandlerFactory::resolve(ConnectionDescriptor::Path(PathBuf::from(path)))
    }

    fn unsupported_message(result: Result<BoxedHandler>) -> String {
        match result {
            Err(DbError::UnsupportedBackend(message)) => message,
            Err(other) => panic!("expected UnsupportedBackend, got {other:?}"),
            Ok(handler) => panic!("expected UnsupportedBackend, got {:?}", handler.kind()),
        }
    }

    #[test]
    fn test_every_extension_resolves() {
        let cases = [
            ("/data/sample.db", BackendKind::SQLite),
            ("/data/sample.dbf", BackendKind::DBase),
            ("/data/sample.db3", BackendKind::DBase),
            ("/data/sample.mdb", BackendKind::Access),
            ("/data/sample.accdb", BackendKind::Access),
            ("/data/sample.mvo", BackendKind::Mvo),
        ];

        for (path, expected) in cases {
            let handler = resolve_path(path).unwrap();
            assert_eq!(handler.kind(), expected, "{path}");
            assert!(!handler.is_connected());
            assert_eq!(handler.display_name(), path);
        }
    }

    #[test]
    fn test_resolution_does_not_touch_the_filesystem() {
        let handler = resolve_path("/definitely/not/here.mvo").unwrap();
        assert_eq!(handler.kind(), BackendKind::Mvo);
    }

    #[test]
    fn test_unknown_extensions_rejected() {
        for path in ["/data/sample.txt", "/data/sample.DB", "/data/sample.Mvo", "/data/db"] {
            let message = unsupported_message(resolve_path(path));
            assert!(message.contains("/data/"), "{message}");
        }

        assert!(unsupported_message(resolve_path("/data/sample.csv")).contains(".csv"));
    }

    #[test]
    fn test_record_kinds() {
        let cases = [
            ("mysql", BackendKind::MySQL),
            ("MySQL", BackendKind::MySQL),
            ("postgresql", BackendKind::PostgreSQL),
            ("postgres", BackendKind::PostgreSQL),
            ("PostgreSQL", BackendKind::PostgreSQL),
        ];

        for (kind, expected) in cases {
            let record = ConnectionRecord::new(kind, "localhost", "user", "pw", "db");
            let handler = HandlerFactory::resolve(record.into()).unwrap();
            assert_eq!(handler.kind(), expected, "{kind}");
        }
    }

    #[test]
    fn test_bad_or_missing_kind_rejected() {
        let record = ConnectionRecord::new("oracle", "localhost", "user", "pw", "db");
        assert!(unsupported_message(HandlerFactory::resolve(record.into())).contains("oracle"));

        let record = ConnectionRecord {
            host: Some("localhost".into()),
            ..Default::default()
        };
        assert!(unsupported_message(HandlerFactory::resolve(record.into())).contains("kind"));
    }

    #[test]
    fn test_record_missing_database_fails_connect() {
        let descriptor = ConnectionDescriptor::parse(
            r#"{"kind": "postgresql", "host": "db.invalid", "user": "u", "password": "p"}"#,
        )
        .unwrap();
        let mut handler = HandlerFactory::resolve(descriptor).unwrap();

        match handler.connect() {
            Err(DbError::MissingParameter(field)) => assert_eq!(field, "database"),
            other => panic!("expected missing database, got {other:?}"),
        }
        assert!(!handler.is_connected());
    }

    #[test]
    fn test_extension_lookup() {
        assert_eq!(
            HandlerFactory::supported_extensions(),
            vec!["db", "dbf", "db3", "mdb", "accdb", "mvo"]
        );
        assert_eq!(
            HandlerFactory::backend_for_extension("accdb"),
            Some(BackendKind::Access)
        );
        assert_eq!(HandlerFactory::backend_for_extension(".db"), None);
        assert_eq!(HandlerFactory::backend_for_kind("sqlite"), None);
    }

    #[test]
    fn test_file_backends_resolve_from_path_only() {
        for kind in BackendKind::all() {
            if kind.is_file_based() {
                let found = HandlerFactory::supported_extensions()
                    .into_iter()
                    .any(|ext| HandlerFactory::backend_for_extension(ext) == Some(kind));
                assert!(found, "{kind} has no extension");
            } else {
                assert!(kind.default_port().is_some(), "{kind} has no default port");
            }
        }
    }
}
