//! Per-dataset pipeline driver.
//!
//! Discovers dataset files under the data root and drives each through
//! load → schema → validate → persist. Load and schema failures are isolated
//! to the file; validation failures are isolated to the record; store
//! failures abort the run, since they mean the persistence layer itself is
//! broken and continuing would silently drop data.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use schemaforge_config::{is_dataset_file, Roots};
use schemaforge_ledger::{LedgerError, VersionLedger};
use schemaforge_loader::{load_records, LoadError};
use schemaforge_schema::{get_or_create, validate_record, SchemaError};
use schemaforge_store::{StoreError, TableStore};

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-file failure modes that do not abort the run.
#[derive(Debug, Error)]
enum FileError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Terminal state of one dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Content and schema hashes match the ledger; nothing to do.
    Skipped,

    /// Processed to completion. `inserted` may be zero when every record
    /// failed validation; the table is not touched in that case.
    Done { inserted: usize, invalid: usize },

    /// Load or schema failure; the rest of the batch continued.
    Failed { reason: String },
}

/// Aggregated outcome of one run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, FileOutcome)>,
}

impl RunSummary {
    fn record(&mut self, key: String, outcome: FileOutcome) {
        self.outcomes.push((key, outcome));
    }

    pub fn outcome(&self, key: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|(k, _)| k == key).map(|(_, o)| o)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Done { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    pub fn invalid_records(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                FileOutcome::Done { invalid, .. } => *invalid,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Drives the full pipeline over every discovered dataset.
pub struct Orchestrator {
    roots: Roots,
    ledger: VersionLedger,
}

impl Orchestrator {
    pub fn new(roots: Roots) -> Result<Self, RunError> {
        let ledger = VersionLedger::load(&roots.ledger_file)?;
        Ok(Self { roots, ledger })
    }

    /// Process every dataset under the data root. The ledger is flushed once
    /// at the end — also on a store failure, so earlier files' commits are
    /// not lost.
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        let files = self.discover();
        info!(datasets = files.len(), data_dir = %self.roots.data_dir.display(), "run started");

        let mut summary = RunSummary::default();
        for data_path in files {
            let Some(key) = self.roots.dataset_key(&data_path) else {
                continue;
            };
            let schema_path = self.roots.schema_path(&data_path);

            let check = self.ledger.check(&key, &data_path, &schema_path)?;
            if !check.process {
                info!(dataset = %key, "unchanged, skipping");
                summary.record(key, FileOutcome::Skipped);
                continue;
            }

            match self.process_file(&data_path, &schema_path) {
                Ok(outcome) => {
                    // Commit only after the dataset reached a terminal
                    // success state; the schema hash is recomputed so a
                    // freshly generated artifact is captured.
                    self.ledger.commit(&key, &data_path, &schema_path)?;
                    summary.record(key, outcome);
                }
                Err(FileError::Store(e)) => {
                    error!(dataset = %key, error = %e, "store failure, aborting run");
                    let _ = self.ledger.flush();
                    return Err(RunError::Store(e));
                }
                Err(e) => {
                    error!(dataset = %key, error = %e, "dataset failed, continuing");
                    summary.record(key, FileOutcome::Failed { reason: e.to_string() });
                }
            }
        }

        self.ledger.flush()?;
        info!(
            processed = summary.processed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            invalid_records = summary.invalid_records(),
            "run finished"
        );
        Ok(summary)
    }

    /// Dataset files under the data root, in sorted order for deterministic
    /// runs.
    fn discover(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.roots.data_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_dataset_file(p))
            .collect();
        files.sort();
        files
    }

    fn process_file(
        &self,
        data_path: &Path,
        schema_path: &Path,
    ) -> Result<FileOutcome, FileError> {
        info!(path = %data_path.display(), "processing dataset");

        let records = load_records(data_path)?;
        let table = Roots::table_name(data_path);
        let schema = get_or_create(schema_path, &table, &records)?;

        let mut valid = Vec::with_capacity(records.len());
        let mut invalid = 0usize;
        for (entry, record) in records.into_iter().enumerate() {
            match validate_record(&record, &schema) {
                Ok(()) => valid.push(record),
                Err(e) => {
                    error!(
                        path = %data_path.display(),
                        entry,
                        field = %e.field(),
                        error = %e,
                        "validation error, record excluded"
                    );
                    invalid += 1;
                }
            }
        }
        if invalid > 0 {
            warn!(
                path = %data_path.display(),
                invalid,
                valid = valid.len(),
                "dataset had invalid records"
            );
        }

        if valid.is_empty() {
            warn!(path = %data_path.display(), "no valid records to insert");
            return Ok(FileOutcome::Done { inserted: 0, invalid });
        }

        let db_path = self.roots.db_path(data_path);
        let mut store = TableStore::open(&db_path)?;
        store.create_table(&schema)?;
        let inserted = store.upsert(&valid, &schema)?;
        info!(
            table = %schema.table,
            db = %db_path.display(),
            inserted,
            "dataset persisted"
        );

        Ok(FileOutcome::Done { inserted, invalid })
    }
}
