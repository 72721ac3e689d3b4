//! Walk through a database with the uniform handler interface.
//!
//! Usage:
//!
//! ```text
//! dbrowser-demo browse <path | json-record>
//! dbrowser-demo samples <dir>
//! ```
//!
//! `browse` connects, lists tables, prints the first rows of the first table
//! and exports that table to `<table>_export.csv` in the working directory.
//! `samples` writes `sample.mvo`, `sample.dbf` and `sample.db` into `<dir>`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use dbrowser::services::database::drivers::{dbase, mvo, sqlite};
use dbrowser::{ConnectionDescriptor, HandlerFactory, LogSink, Row, Value};

const PREVIEW_ROWS: usize = 3;

const USAGE: &str = "usage: dbrowser-demo browse <path|json> | dbrowser-demo samples <dir>";

fn main() -> Result<()> {
    let dispatch = init_logging();
    let _guard = tracing::dispatcher::set_default(&dispatch);
    let sink = LogSink::new(dispatch);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [command, target] if command == "browse" => browse(target, sink),
        [command, dir] if command == "samples" => create_samples(Path::new(dir)),
        _ => bail!(USAGE),
    }
}

fn init_logging() -> tracing::Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::Dispatch::new(subscriber)
}

fn browse(target: &str, sink: LogSink) -> Result<()> {
    let descriptor = ConnectionDescriptor::parse(target)
        .with_context(|| format!("cannot read connection argument {target}"))?;
    let name = descriptor.display_name();

    let mut handler = HandlerFactory::resolve_with_sink(descriptor, sink)
        .with_context(|| format!("no handler for {name}"))?;

    tracing::info!(backend = %handler.kind(), target = %name, "connecting");
    handler
        .connect()
        .with_context(|| format!("failed to connect to {name}"))?;

    let tables = handler.get_tables().context("failed to list tables")?;
    tracing::info!(?tables, "tables found");

    let Some(first) = tables.first() else {
        tracing::warn!("no tables found in the database");
        handler.close();
        return Ok(());
    };

    let result = handler
        .select_all(first)
        .with_context(|| format!("failed to query {first}"))?;
    for row in result.rows.iter().take(PREVIEW_ROWS) {
        println!("{}", serde_json::to_string_pretty(&row_to_json(row))?);
    }

    let output = PathBuf::from(format!("{first}_export.csv"));
    let written = handler
        .export_to_csv(first, &output)
        .with_context(|| format!("failed to export {first}"))?;
    println!("exported {written} rows from {first} to {}", output.display());

    handler.close();
    Ok(())
}

fn create_samples(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    let mvo_path = dir.join("sample.mvo");
    mvo::create_sample_database(&mvo_path)
        .with_context(|| format!("cannot write {}", mvo_path.display()))?;

    let dbf_path = dir.join("sample.dbf");
    dbase::create_sample_database(&dbf_path)
        .with_context(|| format!("cannot write {}", dbf_path.display()))?;

    let db_path = dir.join("sample.db");
    if db_path.exists() {
        std::fs::remove_file(&db_path)
            .with_context(|| format!("cannot replace {}", db_path.display()))?;
    }
    sqlite::create_sample_database(&db_path)
        .with_context(|| format!("cannot write {}", db_path.display()))?;

    println!("sample databases written to {}", dir.display());
    Ok(())
}

fn row_to_json(row: &Row) -> serde_json::Value {
    let object = row
        .iter()
        .map(|cell| {
            let value = match &cell.value {
                Value::Null => serde_json::Value::Null,
                Value::Integer(i) => (*i).into(),
                Value::Float(f) => (*f).into(),
                Value::Text(s) => s.clone().into(),
                Value::Date(d) => d.to_string().into(),
            };
            (cell.column.clone(), value)
        })
        .collect();
    serde_json::Value::Object(object)
}
