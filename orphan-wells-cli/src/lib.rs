//! Command-line interface for orphaned-well reconciliation runs.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use orphan_wells_fs::EntryKind;

mod check;
mod error;
mod reconcile;

pub use error::CliError;

use check::{CheckArgs, run_check};
use reconcile::{ReconcileArgs, run_reconcile};

const ARG_MANIFEST: &str = "manifest";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_BOUNDARIES: &str = "boundaries";
const ENV_RECONCILE_MANIFEST: &str = "ORPHAN_WELLS_CMDS_RECONCILE_MANIFEST";
const ENV_CHECK_MANIFEST: &str = "ORPHAN_WELLS_CMDS_CHECK_MANIFEST";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
/// Returns the first configuration, input or output failure.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Reconcile(args) => run_reconcile(args, &mut stdout),
        Command::Check(args) => run_check(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "orphan-wells",
    about = "Reconcile state orphaned-well registries against national and baseline datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reconciliation and write the GeoJSON artefacts.
    Reconcile(ReconcileArgs),
    /// Validate a manifest by parsing every source's headers.
    Check(CheckArgs),
}

fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match orphan_wells_fs::entry_kind(path) {
        Ok(EntryKind::File) => Ok(()),
        Ok(EntryKind::Missing) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Ok(EntryKind::Directory | EntryKind::Other) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
