//! Collapse of records sharing an identifier.
//!
//! Registries list the same well more than once: repeated exports, several
//! status rows, or conflicting surveys. [`deduplicate`] resolves each group
//! of records with the same `source_id` under a [`DuplicatePolicy`] and
//! returns exactly one [`CanonicalWellRecord`] per surviving key, ordered by
//! key.

use std::collections::{BTreeMap, HashSet};

use log::{info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::record::{CanonicalWellRecord, WellRecord};
use crate::status::WellStatus;

/// How groups of records sharing a key are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum DuplicatePolicy {
    /// Collapse exact duplicates, drop keys seen at several locations, then
    /// prefer plugged over orphaned over the latest listing.
    #[default]
    Reconcile,
    /// Drop every key listed more than once.
    DropAll,
}

/// Counts describing one deduplication run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DedupReport {
    /// Records received.
    pub input: usize,
    /// Records removed as exact copies of another record.
    pub exact_duplicates: usize,
    /// Keys dropped entirely.
    pub ambiguous_keys: usize,
    /// Records belonging to dropped keys.
    pub ambiguous_records: usize,
    /// Keys whose remaining records were reduced to one by status priority.
    pub resolved_conflicts: usize,
    /// Records returned.
    pub output: usize,
}

/// Result of [`deduplicate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deduplication {
    /// One record per key, ordered by key.
    pub records: Vec<CanonicalWellRecord>,
    /// What happened along the way.
    pub report: DedupReport,
}

type CoordinateBits = (Option<u64>, Option<u64>);

// Adding zero folds -0.0 onto 0.0 so both compare equal.
fn coordinate_bits(record: &WellRecord) -> CoordinateBits {
    (
        record.latitude.map(|value| (value + 0.0).to_bits()),
        record.longitude.map(|value| (value + 0.0).to_bits()),
    )
}

fn collapse_exact(group: Vec<WellRecord>) -> (Vec<WellRecord>, usize) {
    let before = group.len();
    let mut seen: HashSet<(WellStatus, CoordinateBits)> = HashSet::new();
    let mut kept: Vec<WellRecord> = group
        .into_iter()
        .rev()
        .filter(|record| seen.insert((record.status.clone(), coordinate_bits(record))))
        .collect();
    kept.reverse();
    let removed = before - kept.len();
    (kept, removed)
}

fn preferred(mut group: Vec<WellRecord>) -> Option<WellRecord> {
    let position = group
        .iter()
        .rposition(|record| record.status.is_plugged())
        .or_else(|| group.iter().rposition(|record| record.status.is_orphaned()))
        .or_else(|| group.len().checked_sub(1))?;
    Some(group.swap_remove(position))
}

/// Resolve records sharing a `source_id`.
///
/// Input order is the listing order: later records are more recent. The
/// function is total and idempotent.
///
/// # Examples
/// ```
/// use orphan_wells_core::{DuplicatePolicy, WellRecord, WellStatus, deduplicate};
///
/// let records = vec![
///     WellRecord::new("001", "Ohio", WellStatus::Orphaned).with_location(40.0, -80.0),
///     WellRecord::new("001", "Ohio", WellStatus::Plugged).with_location(40.0, -80.0),
///     WellRecord::new("002", "Ohio", WellStatus::Orphaned).with_location(40.0, -80.0),
///     WellRecord::new("002", "Ohio", WellStatus::Orphaned).with_location(41.0, -80.0),
/// ];
/// let outcome = deduplicate(records, DuplicatePolicy::Reconcile);
/// assert_eq!(outcome.records.len(), 1);
/// assert_eq!(outcome.records[0].well.status, WellStatus::Plugged);
/// assert_eq!(outcome.report.ambiguous_keys, 1);
/// ```
pub fn deduplicate(records: Vec<WellRecord>, policy: DuplicatePolicy) -> Deduplication {
    let mut report = DedupReport {
        input: records.len(),
        ..DedupReport::default()
    };
    let mut groups: BTreeMap<String, Vec<WellRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.source_id.clone())
            .or_default()
            .push(record);
    }

    let mut survivors = Vec::with_capacity(groups.len());
    for (key, group) in groups {
        match policy {
            DuplicatePolicy::DropAll if group.len() > 1 => {
                report.ambiguous_keys += 1;
                report.ambiguous_records += group.len();
            }
            DuplicatePolicy::DropAll => survivors.extend(group),
            DuplicatePolicy::Reconcile => {
                let (group, removed) = collapse_exact(group);
                report.exact_duplicates += removed;
                let locations: HashSet<CoordinateBits> =
                    group.iter().map(coordinate_bits).collect();
                if locations.len() > 1 {
                    warn!(
                        "dropping well {key}: listed at {} different locations",
                        locations.len()
                    );
                    report.ambiguous_keys += 1;
                    report.ambiguous_records += group.len();
                    continue;
                }
                if group.len() > 1 {
                    report.resolved_conflicts += 1;
                }
                survivors.extend(preferred(group));
            }
        }
    }

    report.output = survivors.len();
    info!(
        "deduplicated {} records into {} ({} exact copies, {} ambiguous keys)",
        report.input, report.output, report.exact_duplicates, report.ambiguous_keys
    );
    Deduplication {
        records: survivors.into_iter().map(CanonicalWellRecord::from).collect(),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::well;
    use rstest::rstest;

    fn ids(outcome: &Deduplication) -> Vec<&str> {
        outcome
            .records
            .iter()
            .map(CanonicalWellRecord::source_id)
            .collect()
    }

    #[rstest]
    fn plugged_wins_over_orphaned() {
        let outcome = deduplicate(
            vec![
                well("001", WellStatus::Orphaned, 40.0, -80.0),
                well("001", WellStatus::Plugged, 40.0, -80.0),
            ],
            DuplicatePolicy::Reconcile,
        );
        assert_eq!(ids(&outcome), vec!["001"]);
        assert_eq!(outcome.records[0].well.status, WellStatus::Plugged);
        assert_eq!(outcome.report.resolved_conflicts, 1);
    }

    #[rstest]
    fn keys_at_several_locations_are_dropped() {
        let outcome = deduplicate(
            vec![
                well("001", WellStatus::Orphaned, 40.0, -80.0),
                well("001", WellStatus::Orphaned, 40.1, -80.0),
            ],
            DuplicatePolicy::Reconcile,
        );
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.report.ambiguous_keys, 1);
        assert_eq!(outcome.report.ambiguous_records, 2);
    }

    #[rstest]
    fn exact_duplicates_keep_the_latest_listing() {
        let first = well("001", WellStatus::Orphaned, 40.0, -80.0).with_operator("Old Co");
        let second = well("001", WellStatus::Orphaned, 40.0, -80.0).with_operator("New Co");
        let outcome = deduplicate(vec![first, second], DuplicatePolicy::Reconcile);
        assert_eq!(outcome.report.exact_duplicates, 1);
        assert_eq!(outcome.report.resolved_conflicts, 0);
        assert_eq!(outcome.records[0].well.operator.as_deref(), Some("New Co"));
    }

    #[rstest]
    fn latest_listing_breaks_ties_between_other_statuses() {
        let outcome = deduplicate(
            vec![
                well("001", WellStatus::other("SI"), 40.0, -80.0),
                well("001", WellStatus::other("TA"), 40.0, -80.0),
            ],
            DuplicatePolicy::Reconcile,
        );
        assert_eq!(outcome.records[0].well.status, WellStatus::other("TA"));
    }

    #[rstest]
    fn orphaned_wins_over_other_statuses() {
        let outcome = deduplicate(
            vec![
                well("001", WellStatus::Orphaned, 40.0, -80.0),
                well("001", WellStatus::other("SI"), 40.0, -80.0),
            ],
            DuplicatePolicy::Reconcile,
        );
        assert_eq!(outcome.records[0].well.status, WellStatus::Orphaned);
    }

    #[rstest]
    fn output_is_ordered_by_key() {
        let outcome = deduplicate(
            vec![
                well("300", WellStatus::Orphaned, 40.0, -80.0),
                well("100", WellStatus::Orphaned, 41.0, -80.0),
                well("200", WellStatus::Orphaned, 42.0, -80.0),
            ],
            DuplicatePolicy::Reconcile,
        );
        assert_eq!(ids(&outcome), vec!["100", "200", "300"]);
    }

    #[rstest]
    fn drop_all_removes_every_repeated_key() {
        let outcome = deduplicate(
            vec![
                well("001", WellStatus::Orphaned, 40.0, -80.0),
                well("001", WellStatus::Orphaned, 40.0, -80.0),
                well("002", WellStatus::Orphaned, 41.0, -80.0),
            ],
            DuplicatePolicy::DropAll,
        );
        assert_eq!(ids(&outcome), vec!["002"]);
        assert_eq!(outcome.report.ambiguous_keys, 1);
        assert_eq!(outcome.report.exact_duplicates, 0);
    }

    #[rstest]
    fn empty_input_yields_empty_output() {
        let outcome = deduplicate(Vec::new(), DuplicatePolicy::Reconcile);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.report, DedupReport::default());
    }
}
