//! The one query shape the embedded engines understand.
//!
//! `SELECT * FROM <table>` with case-insensitive keywords, any amount of
//! whitespace between tokens, and an optional trailing `;`. The table name may
//! be wrapped in `"…"`, `'…'`, `` `…` `` or `[…]`; unquoted names are limited
//! to letters, digits, `_`, `.` and `$`. Everything else is rejected with
//! `UnsupportedQuery` instead of being partially interpreted.

use crate::services::database::error::{DbError, Result};

const QUOTE_CHARS: [char; 5] = ['"', '\'', '`', '[', ']'];

/// A parsed `SELECT * FROM <table>` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectAll {
    pub table: String,
}

/// Parse `query` into its target table.
pub fn parse_select_all(query: &str) -> Result<SelectAll> {
    let reject = |reason: &str| DbError::unsupported_query(query, reason);

    let mut text = query.trim();
    if let Some(stripped) = text.strip_suffix(';') {
        text = stripped.trim_end();
    }

    let rest = take_keyword(text, "SELECT")
        .ok_or_else(|| reject("only SELECT * FROM <table> is supported"))?;

    let rest = rest
        .strip_prefix('*')
        .filter(|r| r.starts_with(char::is_whitespace))
        .ok_or_else(|| reject("column projection is not supported; use SELECT *"))?
        .trim_start();

    let rest = take_keyword(rest, "FROM").ok_or_else(|| reject("expected FROM after SELECT *"))?;

    let table = parse_table_name(rest).map_err(|reason| reject(reason))?;
    Ok(SelectAll { table })
}

/// Strip a case-insensitive keyword that must be followed by whitespace.
fn take_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let head = input.get(..keyword.len())?;
    let tail = &input[keyword.len()..];
    if head.eq_ignore_ascii_case(keyword) && tail.starts_with(char::is_whitespace) {
        Some(tail.trim_start())
    } else {
        None
    }
}

fn parse_table_name(input: &str) -> std::result::Result<String, &'static str> {
    let Some(first) = input.chars().next() else {
        return Err("missing table name");
    };

    let closing = match first {
        '"' | '\'' | '`' => Some(first),
        '[' => Some(']'),
        _ => None,
    };

    let name = match closing {
        Some(closing) => {
            let inner = &input[first.len_utf8()..];
            let end = inner
                .find(closing)
                .ok_or("unbalanced quotes around table name")?;
            let after = &inner[end + closing.len_utf8()..];
            if !after.is_empty() {
                return Err(trailing_reason(after));
            }
            let name = &inner[..end];
            if name.contains(&QUOTE_CHARS[..]) {
                return Err("mismatched quotes around table name");
            }
            name
        }
        None => {
            if input.contains(',') {
                return Err("joins are not supported");
            }
            if let Some(pos) = input.find(char::is_whitespace) {
                return Err(trailing_reason(&input[pos..]));
            }
            if input.contains(&QUOTE_CHARS[..]) {
                return Err("unbalanced quotes around table name");
            }
            if !input.chars().all(is_identifier_char) {
                return Err("unexpected character in unquoted table name");
            }
            input
        }
    };

    if name.is_empty() {
        return Err("missing table name");
    }
    Ok(name.to_string())
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$')
}

fn trailing_reason(trailing: &str) -> &'static str {
    let upper = trailing.trim_start().to_ascii_uppercase();
    if upper.starts_with("WHERE") {
        "WHERE clauses are not supported"
    } else if upper.starts_with("ORDER") {
        "ordering is not supported"
    } else if upper.starts_with("JOIN")
        || upper.contains(" JOIN ")
        || upper.starts_with("INNER")
        || upper.starts_with("LEFT")
    {
        "joins are not supported"
    } else {
        "unexpected text after table name"
    }
}
