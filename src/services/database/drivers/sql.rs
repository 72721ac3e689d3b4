//! Helpers shared by the sqlx-backed handlers.

use chrono::NaiveDate;
use sqlx::query::Query;
use sqlx::{Database, Encode, Type};

use crate::services::database::error::DbError;
use crate::services::database::traits::Value;

/// SQLSTATE codes for undefined relations and columns.
///
/// `42P01`/`42703` are PostgreSQL's, `42S02`/`42S22` are MySQL's.
const UNDEFINED_OBJECT_CODES: [&str; 4] = ["42P01", "42703", "42S02", "42S22"];

/// SQLite reports undefined objects only through the message text.
const UNDEFINED_OBJECT_MESSAGES: [&str; 2] = ["no such table", "no such column"];

/// Bind `params` positionally onto `query`.
pub(crate) fn bind_values<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &[Value],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    NaiveDate: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Integer(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(s) => query.bind(s.clone()),
            Value::Date(d) => query.bind(*d),
        };
    }
    query
}

/// Map a driver error raised while running `query`.
///
/// Undefined tables and columns become `Schema`; every other rejection is a
/// `Query` error carrying the driver message.
pub(crate) fn classify_error(query: &str, error: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db_error) = &error {
        let code_matches = db_error
            .code()
            .is_some_and(|code| UNDEFINED_OBJECT_CODES.contains(&code.as_ref()));
        let message = db_error.message();
        let message_matches = UNDEFINED_OBJECT_MESSAGES
            .iter()
            .any(|needle| message.contains(needle));

        if code_matches || message_matches {
            return DbError::Schema {
                message: message.to_string(),
            };
        }
    }

    DbError::Query {
        query: query.to_string(),
        message: error.to_string(),
    }
}

/// Quote an identifier with `quote`, doubling any embedded quote characters.
pub(crate) fn quote_identifier(name: &str, quote: char) -> String {
    let escaped = name.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("Employees", '"'), "\"Employees\"");
        assert_eq!(quote_identifier("Order Items", '`'), "`Order Items`");
        assert_eq!(quote_identifier("we\"ird", '"'), "\"we\"\"ird\"");
    }

    #[test]
    fn test_non_database_errors_are_query_errors() {
        let err = classify_error("SELECT 1", sqlx::Error::RowNotFound);
        match err {
            DbError::Query { query, .. } => assert_eq!(query, "SELECT 1"),
            other => panic!("expected query error, got {other:?}"),
        }
    }
}
