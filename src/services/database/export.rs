//! CSV export shared by every handler.
//!
//! Output is a header line of column names followed by one line per row,
//! comma-separated, UTF-8, `\n`-terminated. Fields are quoted only when they
//! contain the separator, a quote, or a line break.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::services::database::error::{DbError, Result};
use crate::services::database::traits::QueryResult;

/// Write `result` to `output_path`, returning the number of data rows written.
pub fn write_csv(output_path: &Path, result: &QueryResult) -> Result<usize> {
    let file = File::create(output_path).map_err(|e| DbError::io(output_path, e))?;
    let written = write_records(file, result).map_err(|e| DbError::io(output_path, e))?;
    Ok(written)
}

/// Write `result` as CSV into any writer.
pub fn write_records<W: Write>(writer: W, result: &QueryResult) -> std::io::Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(&result.columns)?;

    for row in &result.rows {
        csv_writer.write_record(row.values().map(|v| v.to_display_string()))?;
    }

    csv_writer.flush()?;
    Ok(result.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::database::traits::{Row, Value};

    fn sample_result() -> QueryResult {
        let columns = vec!["id".to_string(), "name".to_string(), "note".to_string()];
        let rows = vec![
            Row::from_parts(
                &columns,
                vec![Value::Integer(1), "Ann".into(), "plain".into()],
            ),
            Row::from_parts(
                &columns,
                vec![Value::Integer(2), "Bo, Jr.".into(), "says \"hi\"\nthen leaves".into()],
            ),
            Row::from_parts(&columns, vec![Value::Integer(3), Value::Null, "ü".into()]),
        ];
        QueryResult::new(columns, rows)
    }

    #[test]
    fn test_write_records_quotes_only_when_needed() {
        let mut buffer = Vec::new();
        let written = write_records(&mut buffer, &sample_result()).unwrap();
        assert_eq!(written, 3);

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "id,name,note\n1,Ann,plain\n2,\"Bo, Jr.\",\"says \"\"hi\"\"\nthen leaves\"\n3,,ü\n"
        );
    }

    #[test]
    fn test_header_written_for_empty_result() {
        let mut buffer = Vec::new();
        let result = QueryResult::new(vec!["a".into(), "b".into()], vec![]);
        assert_eq!(write_records(&mut buffer, &result).unwrap(), 0);
        assert_eq!(String::from_utf8(buffer).unwrap(), "a,b\n");
    }

    #[test]
    fn test_write_csv_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let result = sample_result();
        write_csv(&path, &result).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, result.columns);

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), result.rows.len());
        for (record, row) in records.iter().zip(&result.rows) {
            let expected: Vec<String> = row.values().map(|v| v.to_display_string()).collect();
            let actual: Vec<&str> = record.iter().collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");

        let err = write_csv(&path, &sample_result()).unwrap_err();
        assert!(matches!(err, DbError::Io { .. }));
    }
}
