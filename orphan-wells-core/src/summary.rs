//! Per-state counts for a reconciliation run.

use std::collections::BTreeMap;
use std::ops::AddAssign;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::clean::ExclusionCounts;
use crate::dedup::DedupReport;
use crate::record::CanonicalWellRecord;
use crate::status::UnmappedStatuses;
use crate::validate::ValidationReport;

/// Key used for records without a state.
pub const UNKNOWN_STATE: &str = "(unknown)";

/// Well counts for one state at each stage of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StateTally {
    /// Rows read from the state's sources after row filters.
    pub loaded: usize,
    /// Records surviving cleaning.
    pub cleaned: usize,
    /// Records surviving deduplication.
    pub deduplicated: usize,
    /// Records their own source lists as plugged after deduplication.
    pub listed_plugged: usize,
    /// Records the reference dataset lists as plugged.
    pub plugged_since_listing: usize,
    /// Records rejected by boundary validation.
    pub outside_boundary: usize,
    /// Records in the final orphaned set.
    pub orphaned: usize,
    /// Final records absent from the baseline.
    pub newly_orphaned: usize,
    /// Baseline records since plugged, by baseline state.
    pub newly_plugged: usize,
}

impl AddAssign for StateTally {
    fn add_assign(&mut self, other: Self) {
        self.loaded += other.loaded;
        self.cleaned += other.cleaned;
        self.deduplicated += other.deduplicated;
        self.listed_plugged += other.listed_plugged;
        self.plugged_since_listing += other.plugged_since_listing;
        self.outside_boundary += other.outside_boundary;
        self.orphaned += other.orphaned;
        self.newly_orphaned += other.newly_orphaned;
        self.newly_plugged += other.newly_plugged;
    }
}

/// Everything worth reporting about a run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RunSummary {
    /// Tallies keyed by state name.
    pub states: BTreeMap<String, StateTally>,
    /// Sum over all states.
    pub totals: StateTally,
    /// Deduplication of the current registries.
    pub current_dedup: DedupReport,
    /// Deduplication of the reference dataset.
    pub reference_dedup: DedupReport,
    /// Cleaning exclusions keyed by source name.
    pub exclusions: BTreeMap<String, ExclusionCounts>,
    /// Status text no table mapped, keyed by source name.
    pub unmapped_statuses: UnmappedStatuses,
    /// Boundary validation, when it ran.
    pub validation: Option<ValidationReport>,
}

impl RunSummary {
    /// Mutable tally for `state`, created on first use.
    pub fn tally_mut(&mut self, state: Option<&str>) -> &mut StateTally {
        self.states
            .entry(state.unwrap_or(UNKNOWN_STATE).to_owned())
            .or_default()
    }

    /// Add one to `stage` of each record's state.
    pub fn count<'a, F>(
        &mut self,
        records: impl IntoIterator<Item = &'a CanonicalWellRecord>,
        stage: F,
    ) where
        F: Fn(&mut StateTally) -> &mut usize,
    {
        for record in records {
            *stage(self.tally_mut(record.well.state.as_deref())) += 1;
        }
    }

    /// Recompute [`RunSummary::totals`] from the per-state tallies.
    pub fn recompute_totals(&mut self) {
        self.totals = StateTally::default();
        for tally in self.states.values() {
            self.totals += *tally;
        }
    }
}
