//! Pipeline orchestration for schemaforge.

mod orchestrator;

pub use orchestrator::{FileOutcome, Orchestrator, RunError, RunSummary};
