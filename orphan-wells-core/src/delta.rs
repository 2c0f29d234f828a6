//! Set differences between the current registry, the baseline report and
//! the national reference dataset.
//!
//! All comparisons go through a [`MatchPolicy`], so a state whose
//! identifiers do not line up can be matched on descriptive fields instead.
//! Records whose key cannot be derived never match: on the current side
//! they count as new, on the baseline side they are never reported as
//! plugged.

use log::info;

use crate::matcher::{KeyIndex, MatchPolicy};
use crate::record::{CanonicalWellRecord, DeltaTag};

/// Current records split by whether the reference lists them as plugged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluggedSplit {
    /// Records the reference does not list as plugged.
    pub retained: Vec<CanonicalWellRecord>,
    /// Records the reference lists as plugged.
    pub plugged: Vec<CanonicalWellRecord>,
}

fn plugged_index(reference: &[CanonicalWellRecord], policy: &MatchPolicy) -> KeyIndex {
    KeyIndex::build(
        reference
            .iter()
            .filter(|record| record.well.status.is_plugged())
            .map(|record| &record.well),
        policy,
    )
}

/// Split off the current records that `reference` lists as `PLUGGED`.
pub fn split_plugged(
    current: Vec<CanonicalWellRecord>,
    reference: &[CanonicalWellRecord],
    policy: &MatchPolicy,
) -> PluggedSplit {
    let index = plugged_index(reference, policy);
    let (plugged, retained): (Vec<_>, Vec<_>) = current
        .into_iter()
        .partition(|record| index.contains(&record.well, policy));
    info!(
        "{} wells listed as plugged in the reference dataset, {} retained",
        plugged.len(),
        retained.len()
    );
    PluggedSplit { retained, plugged }
}

/// Records of `left` whose key does not occur in `right`.
///
/// # Examples
/// ```
/// use orphan_wells_core::{CanonicalWellRecord, MatchPolicy, WellRecord, WellStatus, difference};
///
/// let record = |id: &str| CanonicalWellRecord::from(WellRecord::new(id, "Ohio", WellStatus::Orphaned));
/// let left = vec![record("1"), record("2")];
/// let right = vec![record("2"), record("3")];
/// let only_left = difference(&left, &right, &MatchPolicy::identifier());
/// assert_eq!(only_left.len(), 1);
/// assert_eq!(only_left[0].source_id(), "1");
/// ```
pub fn difference(
    left: &[CanonicalWellRecord],
    right: &[CanonicalWellRecord],
    policy: &MatchPolicy,
) -> Vec<CanonicalWellRecord> {
    let index = KeyIndex::build(right.iter().map(|record| &record.well), policy);
    left.iter()
        .filter(|record| !index.contains(&record.well, policy))
        .cloned()
        .collect()
}

/// Tag every current record as newly orphaned or previously known.
///
/// A record is newly orphaned when its key is absent from `baseline`.
pub fn tag_against_baseline(
    current: Vec<CanonicalWellRecord>,
    baseline: &[CanonicalWellRecord],
    policy: &MatchPolicy,
) -> Vec<CanonicalWellRecord> {
    let index = KeyIndex::build(baseline.iter().map(|record| &record.well), policy);
    current
        .into_iter()
        .map(|record| {
            let tag = if index.contains(&record.well, policy) {
                DeltaTag::PreviouslyKnown
            } else {
                DeltaTag::NewlyOrphaned
            };
            record.tagged(tag)
        })
        .collect()
}

/// Records tagged newly orphaned.
pub fn newly_orphaned(tagged: &[CanonicalWellRecord]) -> Vec<CanonicalWellRecord> {
    tagged
        .iter()
        .filter(|record| record.delta == Some(DeltaTag::NewlyOrphaned))
        .cloned()
        .collect()
}

/// Comparison sets and policies for [`newly_plugged`].
#[derive(Debug, Clone, Copy)]
pub struct PluggedComparison<'a> {
    /// Every current record, before the plugged filter.
    pub current: &'a [CanonicalWellRecord],
    /// The national reference dataset.
    pub reference: &'a [CanonicalWellRecord],
    /// Policy relating baseline records to current ones.
    pub baseline_policy: &'a MatchPolicy,
    /// Policy relating baseline records to the reference.
    pub reference_policy: &'a MatchPolicy,
    /// Identifier prefixes of placeholder baseline identifiers.
    pub sentinel_prefixes: &'a [String],
}

/// Baseline records absent from the current set that the reference now
/// lists as plugged.
///
/// Baseline identifiers starting with a sentinel prefix are placeholders
/// assigned by the baseline's authors and are skipped.
pub fn newly_plugged(
    baseline: &[CanonicalWellRecord],
    comparison: &PluggedComparison<'_>,
) -> Vec<CanonicalWellRecord> {
    let plugged = plugged_index(comparison.reference, comparison.reference_policy);
    difference(baseline, comparison.current, comparison.baseline_policy)
        .into_iter()
        .filter(|record| {
            !comparison
                .sentinel_prefixes
                .iter()
                .any(|prefix| record.source_id().starts_with(prefix.as_str()))
        })
        .filter(|record| plugged.contains(&record.well, comparison.reference_policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::WellStatus;
    use crate::test_support::canonical;
    use rstest::{fixture, rstest};

    fn record(id: &str, status: WellStatus) -> CanonicalWellRecord {
        canonical(id, "Ohio", status)
    }

    fn ids(records: &[CanonicalWellRecord]) -> Vec<&str> {
        records.iter().map(CanonicalWellRecord::source_id).collect()
    }

    #[fixture]
    fn policy() -> MatchPolicy {
        MatchPolicy::identifier()
    }

    #[rstest]
    fn tags_current_records(policy: MatchPolicy) {
        let current = vec![
            record("1", WellStatus::Orphaned),
            record("2", WellStatus::Orphaned),
        ];
        let baseline = vec![record("2", WellStatus::Orphaned)];
        let tagged = tag_against_baseline(current, &baseline, &policy);
        let tags: Vec<Option<DeltaTag>> = tagged.iter().map(|record| record.delta).collect();
        assert_eq!(
            tags,
            vec![Some(DeltaTag::NewlyOrphaned), Some(DeltaTag::PreviouslyKnown)]
        );
        assert_eq!(ids(&newly_orphaned(&tagged)), vec!["1"]);
    }

    #[rstest]
    fn splits_plugged_records(policy: MatchPolicy) {
        let current = vec![
            record("1", WellStatus::Orphaned),
            record("2", WellStatus::Orphaned),
        ];
        let reference = vec![
            record("1", WellStatus::Plugged),
            record("2", WellStatus::other("ACTIVE")),
        ];
        let split = split_plugged(current, &reference, &policy);
        assert_eq!(ids(&split.plugged), vec!["1"]);
        assert_eq!(ids(&split.retained), vec!["2"]);
    }

    #[rstest]
    fn newly_plugged_needs_reference_confirmation(policy: MatchPolicy) {
        let baseline = vec![
            record("1", WellStatus::Orphaned),
            record("2", WellStatus::Orphaned),
            record("3", WellStatus::Orphaned),
            record("ID-9", WellStatus::Orphaned),
        ];
        let current = vec![record("1", WellStatus::Orphaned)];
        let reference = vec![
            record("1", WellStatus::Plugged),
            record("2", WellStatus::Plugged),
            record("3", WellStatus::Orphaned),
            record("ID-9", WellStatus::Plugged),
        ];
        let sentinels = vec!["ID".to_owned(), "D".to_owned()];
        let comparison = PluggedComparison {
            current: &current,
            reference: &reference,
            baseline_policy: &policy,
            reference_policy: &policy,
            sentinel_prefixes: &sentinels,
        };
        assert_eq!(ids(&newly_plugged(&baseline, &comparison)), vec!["2"]);
    }
}
