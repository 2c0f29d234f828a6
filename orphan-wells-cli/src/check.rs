//! Check command implementation.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use orphan_wells_core::StateBoundaries;
use orphan_wells_data::{BoundarySpec, Manifest, SourceCheck, load_state_boundaries};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_BOUNDARIES, ARG_MANIFEST, CliError, ENV_CHECK_MANIFEST, require_existing};

/// CLI arguments for the `check` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "check",
    long_about = "Parse the manifest, read the header of every source file and \
                 confirm each field mapping names existing columns. State \
                 boundaries are loaded when configured. Nothing is written.",
    about = "Validate a manifest without running the reconciliation"
)]
#[ortho_config(prefix = "ORPHAN_WELLS")]
pub(crate) struct CheckArgs {
    /// Path to the run manifest (TOML).
    #[arg(long = ARG_MANIFEST, value_name = "path")]
    #[serde(default)]
    pub(crate) manifest: Option<Utf8PathBuf>,
    /// Override the manifest's state boundary GeoJSON.
    #[arg(long = ARG_BOUNDARIES, value_name = "path")]
    #[serde(default)]
    pub(crate) boundaries: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckConfig {
    pub(crate) manifest: Utf8PathBuf,
    pub(crate) boundaries: Option<Utf8PathBuf>,
}

impl TryFrom<CheckArgs> for CheckConfig {
    type Error = CliError;

    fn try_from(args: CheckArgs) -> Result<Self, Self::Error> {
        let manifest = args.manifest.ok_or(CliError::MissingArgument {
            field: ARG_MANIFEST,
            env: ENV_CHECK_MANIFEST,
        })?;
        Ok(Self {
            manifest,
            boundaries: args.boundaries,
        })
    }
}

pub(crate) fn run_check(args: CheckArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = CheckConfig::try_from(merged)?;
    execute_check(&config, writer)
}

pub(crate) fn execute_check(config: &CheckConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    require_existing(&config.manifest, ARG_MANIFEST)?;
    if let Some(boundaries) = &config.boundaries {
        require_existing(boundaries, ARG_BOUNDARIES)?;
    }
    let manifest = Manifest::load(&config.manifest)?;
    let checks = manifest.check()?;
    let boundaries = manifest
        .boundary_spec(config.boundaries.as_deref())
        .map(|spec| load_state_boundaries(&spec).map(|loaded| (spec, loaded)))
        .transpose()?;

    write_check_report(writer, &checks, boundaries.as_ref()).map_err(CliError::WriteReport)
}

fn write_check_report(
    writer: &mut dyn Write,
    checks: &[SourceCheck],
    boundaries: Option<&(BoundarySpec, StateBoundaries)>,
) -> std::io::Result<()> {
    for check in checks {
        write_check(writer, check)?;
    }
    match boundaries {
        Some((spec, loaded)) => writeln!(
            writer,
            "boundaries\t{} states\t{}",
            loaded.len(),
            spec.path
        ),
        None => writeln!(writer, "boundaries\tnot configured"),
    }
}

fn write_check(writer: &mut dyn Write, check: &SourceCheck) -> std::io::Result<()> {
    writeln!(
        writer,
        "{}\t{}\t{} files\t{} columns",
        check.role,
        check.name,
        check.files.len(),
        check.columns
    )
}
