//! Facade crate for orphaned-well registry reconciliation.
//!
//! This crate re-exports the core pipeline types and, behind the `data`
//! feature, the manifest, readers and artefact writers.

#![forbid(unsafe_code)]

pub use orphan_wells_core::{
    CanonicalWellRecord, DeltaTag, DuplicatePolicy, FieldMapping, MatchPolicy, RawTable,
    ReconcileInput, Reconciler, Reconciliation, RunSummary, SourceBatch, StateBoundaries,
    StatusNormalizer, StatusTable, TargetField, WellRecord, WellStatus, deduplicate, difference,
    newly_plugged, retain_within_claimed_state, tag_against_baseline, unify,
};

#[cfg(feature = "data")]
pub use orphan_wells_data::{
    Artefacts, Manifest, ManifestError, RunError, reconcile_manifest, write_artefacts,
};
