//! Tabular (CSV) loading
//!
//! Every REFLACX table is comma separated with a header row. Tables are read
//! either as untyped rows keyed by header name, or deserialized straight into
//! a record type.

use crate::{Error, Result};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// One table row: column name → cell text
pub type Row = BTreeMap<String, String>;

fn reader_for(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    Ok(ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)?)
}

/// Load a table as a sequence of header-keyed rows
pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = reader_for(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.to_string(), cell.to_string()))
            .collect();
        rows.push(row);
    }

    tracing::trace!(path = %path.display(), rows = rows.len(), "Loaded table");
    Ok(rows)
}

/// Load a table, deserializing each row into `T` by header name
///
/// Columns without a matching field are ignored.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = reader_for(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(records)
}

/// Borrow a required cell
pub fn row_str<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| Error::missing_field(column))
}

/// Parse a required numeric cell
pub fn row_f64(row: &Row, column: &str) -> Result<f64> {
    let raw = row_str(row, column)?;
    raw.parse::<f64>().map_err(|e| {
        Error::InvalidInput(format!("column '{}' value '{}': {}", column, raw, e))
    })
}

/// Interpret a cell as a boolean flag
///
/// Accepts the spellings produced by spreadsheet and pandas exports.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "TRUE" | "True" | "true" => Some(true),
        "FALSE" | "False" | "false" => Some(false),
        _ => None,
    }
}
