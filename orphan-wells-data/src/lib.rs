//! File access for orphaned-well reconciliation.
//!
//! Responsibilities:
//! - Parse the run manifest and turn it into a
//!   [`Reconciler`](orphan_wells_core::Reconciler).
//! - Read CSV and GeoJSON sources, optionally bzip2 compressed.
//! - Load state boundary polygons.
//! - Write GeoJSON artefacts and the JSON run summary.
//!
//! Boundaries:
//! - Reconciliation rules live in `orphan-wells-core`; this crate only
//!   moves data between files and core types.

#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use orphan_wells_core::{BoundaryProvider, Reconciliation};
use thiserror::Error;

pub mod boundaries;
pub mod export;
pub mod geojson;
pub mod manifest;
pub mod reader;

pub use boundaries::{BoundaryError, BoundarySpec, DEFAULT_STATE_PROPERTY, load_state_boundaries};
pub use export::{ExportError, well_feature, write_geojson, write_summary};
pub use manifest::{
    LoadedSources, Manifest, ManifestError, MatcherSpec, Matching, MatchingSpec, Settings,
    SourceCheck, SourceRole, SourceSpec, StatusSpec,
};
pub use reader::{
    GEOMETRY_X, GEOMETRY_Y, SourceError, SourceFormat, is_bz2, open_source, read_headers,
    read_table,
};

/// File name of the final orphaned set.
pub const ORPHANED_ARTEFACT: &str = "orphaned_wells.geojson";
/// File name of the wells absent from the baseline.
pub const NEWLY_ORPHANED_ARTEFACT: &str = "newly_orphaned.geojson";
/// File name of the baseline wells since plugged.
pub const NEWLY_PLUGGED_ARTEFACT: &str = "newly_plugged.geojson";
/// File name of the run summary.
pub const SUMMARY_ARTEFACT: &str = "summary.json";

/// Errors raised by [`reconcile_manifest`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The manifest or one of its sources could not be used.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// State boundaries could not be loaded.
    #[error(transparent)]
    Boundaries(#[from] BoundaryError),
}

/// Read every source named by `manifest` and run the pipeline.
///
/// `boundaries` overrides the manifest's boundary file. Validation is
/// skipped when neither names one.
///
/// # Errors
/// Fails when a source file or the boundary file cannot be read.
pub fn reconcile_manifest(
    manifest: &Manifest,
    boundaries: Option<&Utf8Path>,
) -> Result<Reconciliation, RunError> {
    let reconciler = manifest.reconciler()?;
    let sources = manifest.load_sources()?;
    let boundaries = manifest
        .boundary_spec(boundaries)
        .map(|spec| load_state_boundaries(&spec))
        .transpose()?;
    if boundaries.is_none() {
        info!("no state boundaries configured; skipping geographic validation");
    }
    let input = sources.into_input(
        boundaries
            .as_ref()
            .map(|boundaries| boundaries as &dyn BoundaryProvider),
    );
    Ok(reconciler.run(input))
}

/// Paths of the artefacts written by [`write_artefacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artefacts {
    /// Final orphaned set.
    pub orphaned: Utf8PathBuf,
    /// Newly orphaned wells.
    pub newly_orphaned: Utf8PathBuf,
    /// Newly plugged wells.
    pub newly_plugged: Utf8PathBuf,
    /// Run summary.
    pub summary: Utf8PathBuf,
}

impl Artefacts {
    /// Artefact paths inside `output_dir`.
    #[must_use]
    pub fn in_dir(output_dir: &Utf8Path) -> Self {
        Self {
            orphaned: output_dir.join(ORPHANED_ARTEFACT),
            newly_orphaned: output_dir.join(NEWLY_ORPHANED_ARTEFACT),
            newly_plugged: output_dir.join(NEWLY_PLUGGED_ARTEFACT),
            summary: output_dir.join(SUMMARY_ARTEFACT),
        }
    }
}

/// Write the three record sets and the summary into `output_dir`.
///
/// # Errors
/// Fails on the first artefact that cannot be written.
pub fn write_artefacts(
    output_dir: &Utf8Path,
    outcome: &Reconciliation,
) -> Result<Artefacts, ExportError> {
    let artefacts = Artefacts::in_dir(output_dir);
    write_geojson(&artefacts.orphaned, &outcome.orphaned)?;
    write_geojson(&artefacts.newly_orphaned, &outcome.newly_orphaned)?;
    write_geojson(&artefacts.newly_plugged, &outcome.newly_plugged)?;
    write_summary(&artefacts.summary, &outcome.summary)?;
    Ok(artefacts)
}
