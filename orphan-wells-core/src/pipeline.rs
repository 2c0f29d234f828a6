//! The reconciliation pipeline.
//!
//! A run takes three groups of sources: the current state registries, the
//! national reference dataset and the baseline report. Each source passes
//! through row filtering, schema unification, cleaning and status
//! normalization. The current registries are then deduplicated and stripped
//! of wells listed as plugged, either by their own source or by the
//! reference. What remains is validated against state boundaries and
//! compared with the baseline.

use std::collections::BTreeMap;

use log::info;

use crate::clean::{CleaningRules, ExclusionCounts, clean_rows, row_state};
use crate::dedup::{DuplicatePolicy, deduplicate};
use crate::delta::{PluggedComparison, newly_orphaned, newly_plugged, split_plugged, tag_against_baseline};
use crate::matcher::MatchPolicy;
use crate::record::{CanonicalWellRecord, WellRecord};
use crate::schema::{FieldMapping, RawTable, RowFilter, unify};
use crate::status::{StatusNormalizer, UnmappedStatuses};
use crate::summary::RunSummary;
use crate::validate::{BoundaryProvider, retain_within_claimed_state};

/// One source's table together with everything needed to read it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    /// Source name; keys status tables and summary entries.
    pub name: String,
    /// State every row belongs to, overriding any state column.
    pub state: Option<String>,
    /// Rows as read.
    pub table: RawTable,
    /// Column mapping onto the target schema.
    pub mapping: FieldMapping,
    /// Row filters applied before unification.
    pub filters: Vec<RowFilter>,
    /// Cleaning rules.
    pub rules: CleaningRules,
}

/// A source after filtering, unification and cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedSource {
    /// Source name.
    pub name: String,
    /// Configured state.
    pub state: Option<String>,
    /// Rows left after the row filters, keyed by the state each row is
    /// filed under.
    pub loaded: BTreeMap<Option<String>, usize>,
    /// Records built from those rows, status not yet normalized.
    pub records: Vec<WellRecord>,
    /// Rows excluded during cleaning.
    pub excluded: ExclusionCounts,
}

/// Filter, unify and clean one source.
pub fn prepare_source(batch: SourceBatch) -> PreparedSource {
    let SourceBatch {
        name,
        state,
        table,
        mapping,
        filters,
        rules,
    } = batch;
    let table = table.filter_rows(&filters);
    let rows = unify(&table, &mapping);
    let outcome = clean_rows(&name, state.as_deref(), &rows, &rules);
    let mut loaded: BTreeMap<Option<String>, usize> = BTreeMap::new();
    for row in &rows {
        *loaded.entry(row_state(state.as_deref(), row)).or_default() += 1;
    }
    info!(
        "{name}: {} rows loaded, {} records after cleaning",
        rows.len(),
        outcome.records.len()
    );
    PreparedSource {
        name,
        state,
        loaded,
        records: outcome.records,
        excluded: outcome.excluded,
    }
}

/// Sources and collaborators for one run.
#[derive(Default)]
pub struct ReconcileInput<'a> {
    /// Current state registries.
    pub current: Vec<SourceBatch>,
    /// National reference dataset.
    pub reference: Vec<SourceBatch>,
    /// Baseline report.
    pub baseline: Vec<SourceBatch>,
    /// State boundaries; validation is skipped when absent.
    pub boundaries: Option<&'a dyn BoundaryProvider>,
}

/// Record sets produced by a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Final orphaned wells, each tagged against the baseline.
    pub orphaned: Vec<CanonicalWellRecord>,
    /// The subset of `orphaned` absent from the baseline.
    pub newly_orphaned: Vec<CanonicalWellRecord>,
    /// Baseline wells since plugged.
    pub newly_plugged: Vec<CanonicalWellRecord>,
    /// Current records the reference lists as plugged.
    pub plugged_since_listing: Vec<CanonicalWellRecord>,
    /// Current records their own source lists as plugged.
    pub listed_plugged: Vec<CanonicalWellRecord>,
    /// Counts for every stage.
    pub summary: RunSummary,
}

/// Pipeline configuration.
///
/// # Examples
/// ```
/// use orphan_wells_core::{
///     FieldMapping, RawTable, ReconcileInput, Reconciler, SourceBatch, StatusNormalizer,
///     StatusTable, TargetField,
/// };
///
/// # fn main() -> Result<(), orphan_wells_core::StatusTableError> {
/// let mapping = FieldMapping::default()
///     .with(TargetField::Identifier, "API")
///     .with(TargetField::Status, "STATUS")
///     .with(TargetField::Latitude, "LAT")
///     .with(TargetField::Longitude, "LON");
/// let table = RawTable::new(
///     vec!["API".into(), "STATUS".into(), "LAT".into(), "LON".into()],
///     vec![
///         vec!["3400100001".into(), "AB".into(), "40.0".into(), "-82.0".into()],
///         vec!["3400100001".into(), "PA".into(), "40.0".into(), "-82.0".into()],
///     ],
/// );
/// let reconciler = Reconciler {
///     normalizer: StatusNormalizer::default()
///         .with_table("Ohio", StatusTable::new(["AB"], ["PA"])?),
///     ..Reconciler::default()
/// };
/// let outcome = reconciler.run(ReconcileInput {
///     current: vec![SourceBatch {
///         name: "Ohio".into(),
///         state: Some("Ohio".into()),
///         table,
///         mapping,
///         ..SourceBatch::default()
///     }],
///     ..ReconcileInput::default()
/// });
/// // Plugged wins the duplicate, so the well is not reported as orphaned.
/// assert!(outcome.orphaned.is_empty());
/// assert_eq!(outcome.summary.current_dedup.resolved_conflicts, 1);
/// assert_eq!(outcome.listed_plugged.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    /// Status tables for every source.
    pub normalizer: StatusNormalizer,
    /// Duplicate handling for the current registries.
    pub current_duplicates: DuplicatePolicy,
    /// Duplicate handling for the reference dataset.
    pub reference_duplicates: DuplicatePolicy,
    /// Matching between current records and the baseline.
    pub baseline_matching: MatchPolicy,
    /// Matching against the reference dataset.
    pub reference_matching: MatchPolicy,
    /// Baseline identifier prefixes that mark placeholders.
    pub sentinel_prefixes: Vec<String>,
}

fn merge_unmapped(into: &mut UnmappedStatuses, from: UnmappedStatuses) {
    for (source, statuses) in from {
        let entry = into.entry(source).or_default();
        for (status, count) in statuses {
            *entry.entry(status).or_default() += count;
        }
    }
}

impl Reconciler {
    fn load(&self, batches: Vec<SourceBatch>, summary: &mut RunSummary, tally: bool) -> Vec<WellRecord> {
        let mut records = Vec::new();
        for batch in batches {
            let prepared = prepare_source(batch);
            if tally {
                for (state, count) in &prepared.loaded {
                    summary.tally_mut(state.as_deref()).loaded += count;
                }
            }
            *summary.exclusions.entry(prepared.name).or_default() += prepared.excluded;
            records.extend(prepared.records);
        }
        let normalised = self.normalizer.normalise_all(records);
        merge_unmapped(&mut summary.unmapped_statuses, normalised.unmapped);
        normalised.records
    }

    /// Run the pipeline.
    ///
    /// Row-level problems are counted in the summary; the run itself never
    /// fails.
    pub fn run(&self, input: ReconcileInput<'_>) -> Reconciliation {
        let mut summary = RunSummary::default();

        let current = self.load(input.current, &mut summary, true);
        for record in &current {
            summary.tally_mut(record.state.as_deref()).cleaned += 1;
        }
        let current = deduplicate(current, self.current_duplicates);
        summary.current_dedup = current.report;
        summary.count(&current.records, |tally| &mut tally.deduplicated);

        let reference = self.load(input.reference, &mut summary, false);
        let reference = deduplicate(reference, self.reference_duplicates);
        summary.reference_dedup = reference.report;

        let baseline: Vec<CanonicalWellRecord> = self
            .load(input.baseline, &mut summary, false)
            .into_iter()
            .map(CanonicalWellRecord::from)
            .collect();

        let (listed_plugged, listed): (Vec<_>, Vec<_>) = current
            .records
            .iter()
            .cloned()
            .partition(|record| record.well.status.is_plugged());
        summary.count(&listed_plugged, |tally| &mut tally.listed_plugged);

        let split = split_plugged(listed, &reference.records, &self.reference_matching);
        summary.count(&split.plugged, |tally| &mut tally.plugged_since_listing);

        let retained = match input.boundaries {
            Some(provider) => {
                let validated = retain_within_claimed_state(split.retained, provider);
                for (state, count) in &validated.outside_by_state {
                    let state = Some(state.as_str()).filter(|state| !state.is_empty());
                    summary.tally_mut(state).outside_boundary += count;
                }
                summary.validation = Some(validated.report);
                validated.records
            }
            None => split.retained,
        };

        let orphaned = tag_against_baseline(retained, &baseline, &self.baseline_matching);
        let fresh = newly_orphaned(&orphaned);
        summary.count(&orphaned, |tally| &mut tally.orphaned);
        summary.count(&fresh, |tally| &mut tally.newly_orphaned);

        let plugged = newly_plugged(
            &baseline,
            &PluggedComparison {
                current: &current.records,
                reference: &reference.records,
                baseline_policy: &self.baseline_matching,
                reference_policy: &self.reference_matching,
                sentinel_prefixes: &self.sentinel_prefixes,
            },
        );
        summary.count(&plugged, |tally| &mut tally.newly_plugged);
        summary.recompute_totals();

        info!(
            "{} orphaned wells, {} newly orphaned, {} newly plugged",
            orphaned.len(),
            fresh.len(),
            plugged.len()
        );
        Reconciliation {
            orphaned,
            newly_orphaned: fresh,
            newly_plugged: plugged,
            plugged_since_listing: split.plugged,
            listed_plugged,
            summary,
        }
    }
}
