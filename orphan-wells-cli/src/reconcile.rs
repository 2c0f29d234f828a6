//! Reconcile command implementation.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use orphan_wells_core::{Reconciliation, StateTally};
use orphan_wells_data::{Artefacts, Manifest, reconcile_manifest, write_artefacts};
use orphan_wells_fs::EntryKind;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BOUNDARIES, ARG_MANIFEST, ARG_OUTPUT_DIR, CliError, ENV_RECONCILE_MANIFEST,
    require_existing,
};

/// CLI arguments for the `reconcile` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "reconcile",
    long_about = "Read every source named by the manifest, reconcile the current \
                 registries against the reference and baseline datasets, and \
                 write orphaned_wells.geojson, newly_orphaned.geojson, \
                 newly_plugged.geojson and summary.json into the output \
                 directory.",
    about = "Run the reconciliation and write its artefacts"
)]
#[ortho_config(prefix = "ORPHAN_WELLS")]
pub(crate) struct ReconcileArgs {
    /// Path to the run manifest (TOML).
    #[arg(long = ARG_MANIFEST, value_name = "path")]
    #[serde(default)]
    pub(crate) manifest: Option<Utf8PathBuf>,
    /// Directory receiving the artefacts; created when missing.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Override the manifest's state boundary GeoJSON.
    #[arg(long = ARG_BOUNDARIES, value_name = "path")]
    #[serde(default)]
    pub(crate) boundaries: Option<Utf8PathBuf>,
}

impl ReconcileArgs {
    pub(crate) fn into_config(self) -> Result<ReconcileConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReconcileConfig::try_from(merged)
    }
}

/// Resolved `reconcile` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReconcileConfig {
    pub(crate) manifest: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) boundaries: Option<Utf8PathBuf>,
}

impl ReconcileConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.manifest, ARG_MANIFEST)?;
        if let Some(boundaries) = &self.boundaries {
            require_existing(boundaries, ARG_BOUNDARIES)?;
        }
        match orphan_wells_fs::entry_kind(&self.output_dir) {
            Ok(EntryKind::Missing | EntryKind::Directory) => Ok(()),
            Ok(EntryKind::File | EntryKind::Other) => Err(CliError::OutputDirectoryNotDirectory {
                path: self.output_dir.clone(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_OUTPUT_DIR,
                path: self.output_dir.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<ReconcileArgs> for ReconcileConfig {
    type Error = CliError;

    fn try_from(args: ReconcileArgs) -> Result<Self, Self::Error> {
        let manifest = args.manifest.ok_or(CliError::MissingArgument {
            field: ARG_MANIFEST,
            env: ENV_RECONCILE_MANIFEST,
        })?;
        let output_dir = args.output_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        Ok(Self {
            manifest,
            output_dir,
            boundaries: args.boundaries,
        })
    }
}

pub(crate) fn run_reconcile(args: ReconcileArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_reconcile_config(args)?;
    execute_reconcile(&config, writer)
}

pub(crate) fn execute_reconcile(
    config: &ReconcileConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let manifest = Manifest::load(&config.manifest)?;
    let outcome = reconcile_manifest(&manifest, config.boundaries.as_deref())?;
    let artefacts = write_artefacts(&config.output_dir, &outcome)?;
    info!(
        "{} orphaned wells written to {}",
        outcome.orphaned.len(),
        config.output_dir
    );
    write_report(writer, &outcome, &artefacts).map_err(CliError::WriteReport)
}

fn resolve_reconcile_config(args: ReconcileArgs) -> Result<ReconcileConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

const REPORT_COLUMNS: [&str; 10] = [
    "state",
    "loaded",
    "cleaned",
    "deduplicated",
    "listed_plugged",
    "plugged_since_listing",
    "outside_boundary",
    "orphaned",
    "newly_orphaned",
    "newly_plugged",
];

fn write_tally(writer: &mut dyn Write, label: &str, tally: &StateTally) -> std::io::Result<()> {
    writeln!(
        writer,
        "{label}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        tally.loaded,
        tally.cleaned,
        tally.deduplicated,
        tally.listed_plugged,
        tally.plugged_since_listing,
        tally.outside_boundary,
        tally.orphaned,
        tally.newly_orphaned,
        tally.newly_plugged,
    )
}

/// Tab-separated per-state counts followed by the artefact paths.
pub(crate) fn write_report(
    writer: &mut dyn Write,
    outcome: &Reconciliation,
    artefacts: &Artefacts,
) -> std::io::Result<()> {
    let summary = &outcome.summary;
    writeln!(writer, "{}", REPORT_COLUMNS.join("\t"))?;
    for (state, tally) in &summary.states {
        write_tally(writer, state, tally)?;
    }
    write_tally(writer, "total", &summary.totals)?;
    for (source, statuses) in &summary.unmapped_statuses {
        let listed: Vec<String> = statuses
            .iter()
            .map(|(status, count)| format!("{status} ({count})"))
            .collect();
        writeln!(writer, "unmapped statuses in {source}: {}", listed.join(", "))?;
    }
    for path in [
        &artefacts.orphaned,
        &artefacts.newly_orphaned,
        &artefacts.newly_plugged,
        &artefacts.summary,
    ] {
        writeln!(writer, "wrote {path}")?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ReconcileConfig, CliError> {
    let merged = ReconcileArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ReconcileConfig::try_from(merged)
}
