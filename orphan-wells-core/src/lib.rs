//! Core reconciliation logic for orphaned oil and gas well registries.
//!
//! State regulators each publish their own list of orphaned wells, in their
//! own columns, status vocabulary and coordinate system. This crate brings
//! those lists onto one schema and reconciles them:
//!
//! - [`unify`] projects source tables onto the [`TargetField`] schema.
//! - [`clean_rows`] parses coordinates, identifiers and dates.
//! - [`StatusNormalizer`] maps source statuses onto `ORPHANED` and `PLUGGED`.
//! - [`deduplicate`] leaves one record per identifier.
//! - [`split_plugged`], [`tag_against_baseline`] and [`newly_plugged`]
//!   compare the result with a national reference dataset and a baseline
//!   report.
//! - [`retain_within_claimed_state`] drops points outside their state.
//!
//! [`Reconciler`] chains the stages. Reading files and writing artefacts
//! live in the `orphan-wells-data` crate.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clean;
pub mod dedup;
pub mod delta;
pub mod identifier;
pub mod matcher;
pub mod pipeline;
pub mod record;
pub mod reproject;
pub mod schema;
pub mod state;
pub mod status;
pub mod summary;
pub mod validate;

pub use clean::{CleanOutcome, CleaningRules, ExclusionCounts, clean_rows, parse_date};
pub use dedup::{DedupReport, Deduplication, DuplicatePolicy, deduplicate};
pub use delta::{
    PluggedComparison, PluggedSplit, difference, newly_orphaned, newly_plugged, split_plugged,
    tag_against_baseline,
};
pub use identifier::{API_LENGTH, IdentifierFormat};
pub use matcher::{CompositeMatcher, IdentifierMatcher, KeyIndex, MatchKey, MatchPolicy, RecordMatcher};
pub use pipeline::{
    PreparedSource, ReconcileInput, Reconciler, Reconciliation, SourceBatch, prepare_source,
};
pub use record::{CanonicalWellRecord, DeltaTag, WellRecord};
pub use reproject::{CoordinateSystem, CrsError, Datum, Reprojection, ZoneFallback};
pub use schema::{
    ColumnSource, FieldMapping, FieldMappingError, RawTable, RowFilter, TargetField, UnifiedRow,
    unify,
};
pub use status::{
    NormalisedRecords, ORPHANED, PLUGGED, StatusNormalizer, StatusTable, StatusTableError,
    UnmappedStatuses, WellStatus,
};
pub use summary::{RunSummary, StateTally, UNKNOWN_STATE};
pub use validate::{
    BoundaryProvider, Containment, StateBoundaries, Validated, ValidationReport, containment,
    retain_within_claimed_state,
};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
