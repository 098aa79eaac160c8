//! Schema artifact persistence.
//!
//! Artifacts are YAML documents mirroring [`Schema`] verbatim. An existing
//! artifact is loaded and trusted as-is; it is never re-derived from data
//! unless deliberately deleted.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::SchemaResult;
use crate::infer::generate_schema;
use crate::model::{Record, Schema};

/// Load a schema artifact.
pub fn load_schema(path: &Path) -> SchemaResult<Schema> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Persist a schema artifact, creating parent directories as needed.
pub fn save_schema(schema: &Schema, path: &Path) -> SchemaResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(schema)?;
    fs::write(path, yaml)?;
    Ok(())
}

/// Resolve the schema for a dataset: load the existing artifact if present,
/// otherwise infer one from the first record, persist it and return it.
///
/// Fails with [`SchemaError::NoData`](crate::SchemaError::NoData) when a
/// schema must be inferred but the dataset is empty.
pub fn get_or_create(path: &Path, table: &str, records: &[Record]) -> SchemaResult<Schema> {
    if path.exists() {
        return load_schema(path);
    }

    let schema = generate_schema(records, table)?;
    save_schema(&schema, path)?;
    info!(
        table = %table,
        path = %path.display(),
        fields = schema.fields.len(),
        "schema artifact generated"
    );
    Ok(schema)
}
