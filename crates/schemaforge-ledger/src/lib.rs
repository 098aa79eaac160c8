//! Incremental-build change tracking.
//!
//! The version ledger maps each dataset key (its path relative to the data
//! root) to the content hashes last seen for its data file and schema
//! artifact. It is loaded once at startup and flushed once at the end of a
//! run. The skip/process decision is pure; the in-memory entry is committed
//! separately, after the dataset has been processed successfully, so a crash
//! mid-run can only cause re-processing, never a wrongly "up to date" mark.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

mod hash;

pub use hash::file_sha256;

/// Errors raised while reading or writing the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("i/o error while accessing ledger: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed ledger file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Last-seen hash state for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub data_hash: Option<String>,
    pub schema_hash: Option<String>,
}

/// Outcome of the change check for one dataset.
#[derive(Debug, Clone)]
pub struct ChangeCheck {
    /// Whether the dataset must be (re)processed.
    pub process: bool,
}

/// Persisted mapping from dataset key to last-seen hashes.
pub struct VersionLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl VersionLedger {
    /// Load the ledger from its side file; an absent file is an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_yaml::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), datasets = entries.len(), "ledger loaded");
        Ok(Self { path, entries })
    }

    /// Decide whether a dataset needs processing. Does not mutate the ledger.
    ///
    /// A dataset is processed iff its schema artifact is missing, or the
    /// recorded data hash differs from the freshly computed one, or the
    /// recorded schema hash differs (covering out-of-band schema edits and
    /// absent ↔ present transitions).
    pub fn check(&self, key: &str, data_path: &Path, schema_path: &Path) -> LedgerResult<ChangeCheck> {
        let data_hash = file_sha256(data_path)?;
        let schema_hash = file_sha256(schema_path)?;
        let schema_exists = schema_hash.is_some();

        let process = match self.entries.get(key) {
            _ if !schema_exists => true,
            None => true,
            Some(entry) => entry.data_hash != data_hash || entry.schema_hash != schema_hash,
        };

        debug!(
            key = %key,
            schema_exists,
            process,
            "change check"
        );
        Ok(ChangeCheck { process })
    }

    /// Record the hash state a dataset reached after successful processing.
    /// Hashes are recomputed here so a freshly generated schema artifact is
    /// captured.
    pub fn commit(&mut self, key: &str, data_path: &Path, schema_path: &Path) -> LedgerResult<()> {
        let entry = LedgerEntry {
            data_hash: file_sha256(data_path)?,
            schema_hash: file_sha256(schema_path)?,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Entry recorded for a dataset, if any.
    pub fn entry(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Number of tracked datasets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the ledger to its side file, once per run.
    pub fn flush(&self) -> LedgerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(&self.entries)?;
        fs::write(&self.path, yaml)?;
        info!(path = %self.path.display(), datasets = self.entries.len(), "ledger flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        ledger_path: PathBuf,
        data: PathBuf,
        schema: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("units_data.yaml");
        let schema = dir.path().join("units_schema.yaml");
        fs::write(&data, "- symbol: m\n").unwrap();
        fs::write(&schema, "table: units\nfields: []\n").unwrap();
        Fixture {
            ledger_path: dir.path().join(".version_ledger.yaml"),
            _dir: dir,
            data,
            schema,
        }
    }

    #[test]
    fn test_unknown_dataset_needs_processing() {
        let fx = fixture();
        let ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        assert!(ledger.check("k", &fx.data, &fx.schema).unwrap().process);
    }

    #[test]
    fn test_committed_dataset_is_skipped() {
        let fx = fixture();
        let mut ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.commit("k", &fx.data, &fx.schema).unwrap();
        assert!(!ledger.check("k", &fx.data, &fx.schema).unwrap().process);
    }

    #[test]
    fn test_data_mutation_triggers_processing() {
        let fx = fixture();
        let mut ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.commit("k", &fx.data, &fx.schema).unwrap();

        fs::write(&fx.data, "- symbol: s\n").unwrap();
        assert!(ledger.check("k", &fx.data, &fx.schema).unwrap().process);
    }

    #[test]
    fn test_schema_edit_triggers_processing() {
        let fx = fixture();
        let mut ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.commit("k", &fx.data, &fx.schema).unwrap();

        fs::write(&fx.schema, "table: units\nfields: []\nmetadata:\n  private: true\n")
            .unwrap();
        assert!(ledger.check("k", &fx.data, &fx.schema).unwrap().process);
    }

    #[test]
    fn test_missing_schema_always_processes() {
        let fx = fixture();
        let mut ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.commit("k", &fx.data, &fx.schema).unwrap();

        fs::remove_file(&fx.schema).unwrap();
        assert!(ledger.check("k", &fx.data, &fx.schema).unwrap().process);
    }

    #[test]
    fn test_check_does_not_mutate() {
        let fx = fixture();
        let ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.check("k", &fx.data, &fx.schema).unwrap();
        assert!(ledger.entry("k").is_none());
    }

    #[test]
    fn test_flush_and_reload_round_trip() {
        let fx = fixture();
        let mut ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.commit("units/units_data.yaml", &fx.data, &fx.schema).unwrap();
        ledger.flush().unwrap();

        let reloaded = VersionLedger::load(&fx.ledger_path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.entry("units/units_data.yaml"),
            ledger.entry("units/units_data.yaml")
        );
        assert!(
            !reloaded.check("units/units_data.yaml", &fx.data, &fx.schema).unwrap().process
        );
    }

    #[test]
    fn test_entries_are_isolated_per_dataset() {
        let fx = fixture();
        let mut ledger = VersionLedger::load(&fx.ledger_path).unwrap();
        ledger.commit("a", &fx.data, &fx.schema).unwrap();
        let before = ledger.entry("a").cloned();

        // Committing another key leaves the first untouched.
        ledger.commit("b", &fx.data, &fx.schema).unwrap();
        assert_eq!(ledger.entry("a").cloned(), before);
    }
}
