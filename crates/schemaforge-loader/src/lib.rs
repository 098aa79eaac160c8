//! Document loader: one dataset file → an ordered sequence of records.
//!
//! Supported formats: YAML (`.yaml`/`.yml`), JSON and CSV. YAML and JSON
//! documents resolve to either a top-level sequence of records or a mapping
//! containing one sequence-valued entry, extracted by a fixed unwrap rule.
//! CSV rows load as string-valued records, one per data row.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use schemaforge_schema::Record;

/// Errors raised while turning a file into records.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("i/o error while reading document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV document: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("entry {index} is not a mapping: {value}")]
    NotARecord { index: usize, value: Value },
}

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load all records from a dataset file, dispatching on the extension.
pub fn load_records(path: &Path) -> LoadResult<Vec<Record>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let records = match ext.as_str() {
        "yaml" | "yml" => {
            let raw = fs::read_to_string(path)?;
            let value: Value = serde_yaml::from_str(&raw)?;
            into_records(unwrap_data(value))?
        }
        "json" => {
            let raw = fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&raw)?;
            into_records(unwrap_data(value))?
        }
        "csv" => load_csv(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    trace!(path = %path.display(), records = records.len(), "document loaded");
    Ok(records)
}

/// Fixed unwrap rule: a mapping yields its first sequence-valued entry, a
/// sequence is returned as-is, anything else yields an empty sequence.
fn unwrap_data(value: Value) -> Vec<Value> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        Value::Array(items) => items,
        _ => vec![],
    }
}

fn into_records(items: Vec<Value>) -> LoadResult<Vec<Record>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(LoadError::NotARecord { index, value: other }),
        })
        .collect()
}

fn load_csv(path: &Path) -> LoadResult<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            record.insert(header.to_string(), Value::String(cell.to_string()));
        }
        records.push(record);
    }
    Ok(records)
}
