use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use schemaforge_config::Roots;
use schemaforge_runner::Orchestrator;

/// Ingest reference datasets: infer schemas, validate records and build
/// per-dataset SQLite tables, reprocessing only what changed.
#[derive(Parser, Debug)]
#[command(name = "schemaforge", version)]
struct Args {
    /// Root directory scanned for `*_data.{yaml,yml,json,csv}` files.
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Root directory for schema artifacts.
    #[arg(long, env = "SCHEMA_DIR", default_value = "schemas")]
    schema_dir: PathBuf,

    /// Root directory for the generated SQLite files.
    #[arg(long, env = "DB_DIR", default_value = "db")]
    db_dir: PathBuf,

    /// Version ledger file.
    #[arg(long, env = "LEDGER_FILE", default_value = ".version_ledger.yaml")]
    ledger_file: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Log level or EnvFilter string (RUST_LOG wins if set).
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    schemaforge_o11y::init(&schemaforge_o11y::Config {
        level: args.log_level.clone(),
        json: args.json_logs,
        with_targets: false,
    });

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "run aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let roots = Roots {
        data_dir: args.data_dir,
        schema_dir: args.schema_dir,
        db_dir: args.db_dir,
        ledger_file: args.ledger_file,
    };
    roots.ensure_dirs().context("create root directories")?;

    let mut orchestrator = Orchestrator::new(roots).context("load version ledger")?;
    orchestrator.run().context("process datasets")?;
    Ok(())
}
