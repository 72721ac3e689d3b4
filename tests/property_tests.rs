//! Property-based tests for the embedded query grammar, the cursor, MVO
//! table discovery and CSV export.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use dbrowser::services::database::drivers::MvoHandler;
    use dbrowser::services::database::mvo::{Cursor, EmbeddedDatabase, parse_select_all};
    use dbrowser::services::database::write_records;
    use dbrowser::{DatabaseHandler, DbError, LogSink, QueryResult, Row, Value};

    fn arb_identifier() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_.$]{0,20}"
    }

    fn arb_keyword_case(keyword: &'static str) -> impl Strategy<Value = String> {
        prop::collection::vec(any::<bool>(), keyword.len()).prop_map(move |upper| {
            keyword
                .chars()
                .zip(upper)
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() })
                .collect()
        })
    }

    fn arb_gap() -> impl Strategy<Value = String> {
        "[ \t\n]{1,3}"
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Integer),
            "[a-zA-Z0-9 ,;\"'\r\n\t]{0,16}".prop_map(Value::Text),
        ]
    }

    /// Distinct table names, in generation order.
    fn arb_table_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_identifier(), 0..8).prop_map(|names| {
            let mut unique: Vec<String> = Vec::new();
            for name in names {
                if !unique.contains(&name) {
                    unique.push(name);
                }
            }
            unique
        })
    }

    fn two_column_rows() -> impl Strategy<Value = Vec<Vec<Value>>> {
        prop::collection::vec(prop::collection::vec(arb_value(), 2), 0..12)
    }

    proptest! {
        #[test]
        fn test_select_all_accepts_identifiers(
            select in arb_keyword_case("select"),
            from in arb_keyword_case("from"),
            gaps in prop::collection::vec(arb_gap(), 3),
            name in arb_identifier(),
            semicolon in any::<bool>(),
        ) {
            let query = format!(
                "{select}{}*{}{from}{}{name}{}",
                gaps[0],
                gaps[1],
                gaps[2],
                if semicolon { ";" } else { "" }
            );
            prop_assert_eq!(parse_select_all(&query).unwrap().table, name);
        }

        #[test]
        fn test_select_all_accepts_any_quoted_name(name in "[a-zA-Z0-9 ;()_*=-]{1,20}") {
            let query = format!("SELECT * FROM \"{name}\"");
            prop_assert_eq!(parse_select_all(&query).unwrap().table, name);
        }

        #[test]
        fn test_select_all_rejects_trailing_junk(
            name in arb_identifier(),
            junk in prop::sample::select(vec![';', '(', ')', '-', '/', '*', '=', '+', ',']),
            tail in "[a-z]{1,6}",
        ) {
            let query = format!("SELECT * FROM {name}{junk}{tail}");
            let is_unsupported = matches!(
                parse_select_all(&query),
                Err(DbError::UnsupportedQuery { .. })
            );
            prop_assert!(is_unsupported, "{} was accepted", query);
        }

        #[test]
        fn test_fetch_one_sequence_matches_fetch_all(rows in two_column_rows()) {
            let mut database = EmbeddedDatabase::new();
            database
                .add_table("T", vec!["a".to_string(), "b".to_string()], rows.clone())
                .unwrap();

            let mut stepping = Cursor::new(&database);
            stepping.execute("SELECT * FROM T").unwrap();
            let mut one_by_one = Vec::new();
            while let Some(row) = stepping.fetch_one().unwrap() {
                one_by_one.push(row);
            }

            let mut bulk = Cursor::new(&database);
            bulk.execute("SELECT * FROM T").unwrap();
            let all = bulk.fetch_all().unwrap();

            prop_assert_eq!(one_by_one.len(), rows.len());
            prop_assert_eq!(all, one_by_one);
        }

        #[test]
        fn test_csv_export_round_trips(rows in two_column_rows()) {
            let columns = vec!["a".to_string(), "b".to_string()];
            let result = QueryResult::new(
                columns.clone(),
                rows.iter().map(|values| Row::from_parts(&columns, values.clone())).collect(),
            );

            let mut buffer = Vec::new();
            let written = write_records(&mut buffer, &result).unwrap();
            prop_assert_eq!(written, rows.len());

            let mut reader = csv::Reader::from_reader(buffer.as_slice());
            let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
            prop_assert_eq!(headers, columns);

            let records: Vec<Vec<String>> = reader
                .records()
                .map(|r| r.unwrap().iter().map(String::from).collect())
                .collect();
            let expected: Vec<Vec<String>> = rows
                .iter()
                .map(|values| values.iter().map(Value::to_display_string).collect())
                .collect();
            prop_assert_eq!(records, expected);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_get_tables_matches_document_order(names in arb_table_names()) {
            let mut database = EmbeddedDatabase::new();
            for name in &names {
                database.add_table(name.clone(), vec!["id".to_string()], vec![]).unwrap();
            }

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("generated.mvo");
            database.save(&path).unwrap();

            let mut handler = MvoHandler::new(&path, LogSink::none());
            handler.connect().unwrap();
            prop_assert_eq!(handler.get_tables().unwrap(), names);
            handler.close();
        }
    }
}
