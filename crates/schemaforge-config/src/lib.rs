//! Configuration surface for schemaforge.
//!
//! Holds the four independently overridable roots (data, schema artifacts,
//! database files, version ledger) and the path derivation rules that tie a
//! dataset file to its schema artifact, its database file and its ledger key.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

mod paths;

pub use paths::{DATA_SUFFIXES, is_dataset_file};

/// Root directories for a run.
///
/// Each root falls back to a conventional name next to the working directory;
/// the CLI layer may override any of them from flags or environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roots {
    /// Where dataset files (`*_data.yaml` etc.) are discovered.
    pub data_dir: PathBuf,

    /// Where schema artifacts (`*_schema.yaml`) live.
    pub schema_dir: PathBuf,

    /// Where per-dataset SQLite files are written.
    pub db_dir: PathBuf,

    /// The version ledger file.
    pub ledger_file: PathBuf,
}

impl Default for Roots {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            schema_dir: PathBuf::from("schemas"),
            db_dir: PathBuf::from("db"),
            ledger_file: PathBuf::from(".version_ledger.yaml"),
        }
    }
}

impl Roots {
    /// Create the three root directories if absent.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.schema_dir)?;
        std::fs::create_dir_all(&self.db_dir)?;
        Ok(())
    }

    /// Ledger key for a dataset: its path relative to the data root, with
    /// forward slashes regardless of platform.
    pub fn dataset_key(&self, data_path: &Path) -> Option<String> {
        let rel = data_path.strip_prefix(&self.data_dir).ok()?;
        let mut key = String::new();
        for comp in rel.components() {
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(&comp.as_os_str().to_string_lossy());
        }
        Some(key)
    }

    /// Schema artifact path: same relative location under the schema root,
    /// with `_data` replaced by `_schema` in the file name.
    pub fn schema_path(&self, data_path: &Path) -> PathBuf {
        let rel = data_path.strip_prefix(&self.data_dir).unwrap_or(data_path);
        let name = rel
            .file_name()
            .map(|n| n.to_string_lossy().replace("_data", "_schema"))
            .unwrap_or_default();
        self.schema_dir.join(rel.with_file_name(name))
    }

    /// Database path: same relative directory under the db root, with the
    /// `_data` suffix stripped from the stem and a `.db` extension.
    pub fn db_path(&self, data_path: &Path) -> PathBuf {
        let rel = data_path.strip_prefix(&self.data_dir).unwrap_or(data_path);
        let stem = rel
            .file_stem()
            .map(|s| s.to_string_lossy().replace("_data", ""))
            .unwrap_or_default();
        let dir = rel.parent().unwrap_or_else(|| Path::new(""));
        self.db_dir.join(dir).join(format!("{stem}.db"))
    }

    /// Table name for a dataset: the file stem with `_data` stripped.
    pub fn table_name(data_path: &Path) -> String {
        data_path
            .file_stem()
            .map(|s| s.to_string_lossy().replace("_data", ""))
            .unwrap_or_default()
    }
}
