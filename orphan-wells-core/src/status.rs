//! Canonical well statuses and the per-source status normalizer.
//!
//! Every registry publishes its own vocabulary for well status. The
//! normalizer folds the entries listed in a source's orphaned and plugged
//! tables onto [`WellStatus::Orphaned`] and [`WellStatus::Plugged`] and keeps
//! everything else as the original text. A source covering several states
//! may carry a table per state, which takes precedence over the source's
//! own table for rows from that state.
//!
//! # Examples
//! ```
//! use orphan_wells_core::{StatusNormalizer, StatusTable, WellStatus};
//!
//! # fn main() -> Result<(), orphan_wells_core::StatusTableError> {
//! let table = StatusTable::new(["AB"], ["PA"])?;
//! let normalizer = StatusNormalizer::default().with_table("Ohio", table);
//!
//! assert_eq!(normalizer.classify("Ohio", "AB"), WellStatus::Orphaned);
//! assert_eq!(normalizer.classify("Ohio", " PA "), WellStatus::Plugged);
//! assert_eq!(normalizer.classify("Ohio", "SI"), WellStatus::other("SI"));
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, warn};
use thiserror::Error;

use crate::record::WellRecord;
use crate::state::name_for;

/// Canonical label for orphaned wells.
pub const ORPHANED: &str = "ORPHANED";
/// Canonical label for plugged wells.
pub const PLUGGED: &str = "PLUGGED";

/// Status of a well after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WellStatus {
    /// The source lists the well as orphaned.
    Orphaned,
    /// The source lists the well as plugged.
    Plugged,
    /// Any status text the source tables do not map.
    Other(String),
    /// The source publishes no status for this well.
    Unreported,
}

impl WellStatus {
    /// Wrap raw status text, trimming surrounding whitespace.
    ///
    /// Canonical labels are recognised so normalized records survive a
    /// round trip through text exports.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
            return Self::Unreported;
        };
        match text {
            ORPHANED => Self::Orphaned,
            PLUGGED => Self::Plugged,
            _ => Self::Other(text.to_owned()),
        }
    }

    /// Build an unmapped status from text.
    pub fn other(text: impl Into<String>) -> Self {
        Self::Other(text.into())
    }

    /// Return the status label; empty for [`WellStatus::Unreported`].
    pub fn as_str(&self) -> &str {
        match self {
            Self::Orphaned => ORPHANED,
            Self::Plugged => PLUGGED,
            Self::Other(text) => text,
            Self::Unreported => "",
        }
    }

    /// Report whether the well is listed as plugged.
    #[must_use]
    pub const fn is_plugged(&self) -> bool {
        matches!(self, Self::Plugged)
    }

    /// Report whether the well is listed as orphaned.
    #[must_use]
    pub const fn is_orphaned(&self) -> bool {
        matches!(self, Self::Orphaned)
    }
}

impl fmt::Display for WellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`StatusTable::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusTableError {
    /// The same status text was listed as both orphaned and plugged.
    #[error("status {status:?} is listed as both orphaned and plugged")]
    Overlap {
        /// Offending status text.
        status: String,
    },
}

/// Orphaned and plugged vocabularies for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    orphaned: BTreeSet<String>,
    plugged: BTreeSet<String>,
}

impl StatusTable {
    /// Build a table from the two vocabularies.
    ///
    /// Entries are trimmed. The tables must be disjoint.
    pub fn new<O, P, S, T>(orphaned: O, plugged: P) -> Result<Self, StatusTableError>
    where
        O: IntoIterator<Item = S>,
        P: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let orphaned: BTreeSet<String> = orphaned
            .into_iter()
            .map(|status| status.as_ref().trim().to_owned())
            .collect();
        let plugged: BTreeSet<String> = plugged
            .into_iter()
            .map(|status| status.as_ref().trim().to_owned())
            .collect();
        if let Some(status) = orphaned.intersection(&plugged).next() {
            return Err(StatusTableError::Overlap {
                status: status.clone(),
            });
        }
        Ok(Self { orphaned, plugged })
    }

    /// Map raw status text onto a canonical status.
    pub fn classify(&self, raw: &str) -> WellStatus {
        let trimmed = raw.trim();
        if self.orphaned.contains(trimmed) {
            WellStatus::Orphaned
        } else if self.plugged.contains(trimmed) {
            WellStatus::Plugged
        } else {
            WellStatus::from_raw(Some(trimmed))
        }
    }

    /// Return whether both vocabularies are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orphaned.is_empty() && self.plugged.is_empty()
    }
}

/// Per-source counts of status text that no table mapped.
pub type UnmappedStatuses = BTreeMap<String, BTreeMap<String, usize>>;

/// Records after normalization together with the statuses left unmapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalisedRecords {
    /// Records whose status has been normalized.
    pub records: Vec<WellRecord>,
    /// Unmapped status text, keyed by source and then by status.
    pub unmapped: UnmappedStatuses,
}

/// Folds a state name or postal abbreviation onto a lookup key.
fn state_key(state: &str) -> String {
    let trimmed = state.trim();
    name_for(trimmed).unwrap_or(trimmed).to_lowercase()
}

/// Applies the per-source status tables to well records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusNormalizer {
    tables: BTreeMap<String, StatusTable>,
    state_tables: BTreeMap<String, BTreeMap<String, StatusTable>>,
    fixed: BTreeMap<String, WellStatus>,
}

impl StatusNormalizer {
    /// Register the status table for a source.
    #[must_use]
    pub fn with_table(mut self, source: impl Into<String>, table: StatusTable) -> Self {
        self.tables.insert(source.into(), table);
        self
    }

    /// Register the status table for rows of `source` that belong to
    /// `state`.
    ///
    /// `state` may be a name or a postal abbreviation; either matches
    /// records carrying the other form.
    ///
    /// ```
    /// use orphan_wells_core::{StatusNormalizer, StatusTable, WellStatus};
    ///
    /// # fn main() -> Result<(), orphan_wells_core::StatusTableError> {
    /// let normalizer = StatusNormalizer::default()
    ///     .with_state_table("FracTracker", "Utah", StatusTable::new(["SI"], ["PA"])?);
    ///
    /// assert_eq!(
    ///     normalizer.classify_in("FracTracker", Some("UT"), "PA"),
    ///     WellStatus::Plugged
    /// );
    /// assert_eq!(
    ///     normalizer.classify_in("FracTracker", Some("Kansas"), "PA"),
    ///     WellStatus::other("PA")
    /// );
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_state_table(
        mut self,
        source: impl Into<String>,
        state: &str,
        table: StatusTable,
    ) -> Self {
        self.state_tables
            .entry(source.into())
            .or_default()
            .insert(state_key(state), table);
        self
    }

    /// Assign every record from `source` the same status regardless of its
    /// raw text.
    #[must_use]
    pub fn with_fixed_status(mut self, source: impl Into<String>, status: WellStatus) -> Self {
        self.fixed.insert(source.into(), status);
        self
    }

    /// Classify raw status text published by `source`.
    ///
    /// Sources without a table pass their status through unchanged.
    pub fn classify(&self, source: &str, raw: &str) -> WellStatus {
        self.classify_in(source, None, raw)
    }

    /// Classify raw status text published by `source` for a well in
    /// `state`.
    pub fn classify_in(&self, source: &str, state: Option<&str>, raw: &str) -> WellStatus {
        if let Some(status) = self.fixed.get(source) {
            return status.clone();
        }
        self.table_for(source, state).map_or_else(
            || WellStatus::from_raw(Some(raw)),
            |table| table.classify(raw),
        )
    }

    fn table_for(&self, source: &str, state: Option<&str>) -> Option<&StatusTable> {
        state
            .and_then(|state| self.state_tables.get(source)?.get(&state_key(state)))
            .or_else(|| self.tables.get(source))
    }

    fn has_vocabulary(&self, source: &str) -> bool {
        self.tables.get(source).is_some_and(|table| !table.is_empty())
            || self
                .state_tables
                .get(source)
                .is_some_and(|tables| tables.values().any(|table| !table.is_empty()))
    }

    /// Normalize a single record's status.
    pub fn normalise(&self, mut record: WellRecord) -> WellRecord {
        if let Some(status) = self.fixed.get(&record.origin) {
            record.status = status.clone();
            return record;
        }
        if let WellStatus::Other(text) = &record.status {
            record.status = self.classify_in(&record.origin, record.state.as_deref(), text);
        }
        record
    }

    /// Normalize a record set, counting the status text left unmapped.
    pub fn normalise_all(&self, records: Vec<WellRecord>) -> NormalisedRecords {
        let mut unmapped = UnmappedStatuses::new();
        let records: Vec<WellRecord> = records
            .into_iter()
            .map(|record| {
                let normalised = self.normalise(record);
                if let WellStatus::Other(text) = &normalised.status {
                    *unmapped
                        .entry(normalised.origin.clone())
                        .or_default()
                        .entry(text.clone())
                        .or_default() += 1;
                }
                normalised
            })
            .collect();
        for (source, statuses) in &unmapped {
            if self.has_vocabulary(source) {
                warn!(
                    "{source}: {} distinct status values left unmapped",
                    statuses.len()
                );
            } else {
                debug!("{source}: no status table; {} values kept", statuses.len());
            }
        }
        NormalisedRecords { records, unmapped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn normalizer() -> StatusNormalizer {
        let table = StatusTable::new(["AB", "D&A"], ["PA", "Plugged Back"]).expect("table");
        StatusNormalizer::default().with_table("Kentucky", table)
    }

    #[rstest]
    #[case("AB", WellStatus::Orphaned)]
    #[case("D&A", WellStatus::Orphaned)]
    #[case("PA", WellStatus::Plugged)]
    #[case("  Plugged Back ", WellStatus::Plugged)]
    #[case("SI", WellStatus::other("SI"))]
    fn classifies_against_source_table(
        normalizer: StatusNormalizer,
        #[case] raw: &str,
        #[case] expected: WellStatus,
    ) {
        assert_eq!(normalizer.classify("Kentucky", raw), expected);
    }

    #[rstest]
    fn unknown_source_passes_status_through(normalizer: StatusNormalizer) {
        assert_eq!(normalizer.classify("Texas", "AB"), WellStatus::other("AB"));
    }

    #[rstest]
    fn overlapping_tables_are_rejected() {
        let err = StatusTable::new(["Abandoned-Not Regulated"], ["Abandoned-Not Regulated"])
            .expect_err("overlap should fail");
        assert_eq!(
            err,
            StatusTableError::Overlap {
                status: "Abandoned-Not Regulated".into()
            }
        );
    }

    #[rstest]
    fn state_tables_apply_only_to_their_state() {
        let utah = StatusTable::new(Vec::<&str>::new(), ["PA"]).expect("table");
        let national = StatusTable::new(["Orphan"], Vec::<&str>::new()).expect("table");
        let normalizer = StatusNormalizer::default()
            .with_table("FracTracker", national)
            .with_state_table("FracTracker", "Utah", utah);
        let records = vec![
            WellRecord::new("4300100001", "FracTracker", WellStatus::other("PA")).with_state("UT"),
            WellRecord::new("4300100002", "FracTracker", WellStatus::other("PA"))
                .with_state("utah"),
            WellRecord::new("1500100001", "FracTracker", WellStatus::other("PA"))
                .with_state("Kansas"),
            WellRecord::new("1500100002", "FracTracker", WellStatus::other("Orphan"))
                .with_state("Kansas"),
        ];

        let outcome = normalizer.normalise_all(records);
        let statuses: Vec<&WellStatus> =
            outcome.records.iter().map(|record| &record.status).collect();
        assert_eq!(
            statuses,
            vec![
                &WellStatus::Plugged,
                &WellStatus::Plugged,
                &WellStatus::other("PA"),
                &WellStatus::Orphaned,
            ]
        );
        assert_eq!(
            outcome
                .unmapped
                .get("FracTracker")
                .and_then(|statuses| statuses.get("PA")),
            Some(&1)
        );
    }

    #[rstest]
    fn fixed_status_overrides_raw_text() {
        let normalizer =
            StatusNormalizer::default().with_fixed_status("USGS", WellStatus::Orphaned);
        let record = WellRecord::new("3700112345", "USGS", WellStatus::Unreported);
        assert_eq!(normalizer.normalise(record).status, WellStatus::Orphaned);
    }

    #[rstest]
    fn counts_unmapped_statuses(normalizer: StatusNormalizer) {
        let records = vec![
            WellRecord::new("1", "Kentucky", WellStatus::other("AB")),
            WellRecord::new("2", "Kentucky", WellStatus::other("SI")),
            WellRecord::new("3", "Kentucky", WellStatus::other("SI")),
            WellRecord::new("4", "Kentucky", WellStatus::Unreported),
        ];
        let outcome = normalizer.normalise_all(records);
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(
            outcome
                .unmapped
                .get("Kentucky")
                .and_then(|statuses| statuses.get("SI")),
            Some(&2)
        );
        assert_eq!(outcome.records[3].status, WellStatus::Unreported);
    }

    #[rstest]
    fn canonical_labels_round_trip() {
        assert_eq!(WellStatus::from_raw(Some("PLUGGED")), WellStatus::Plugged);
        assert_eq!(WellStatus::from_raw(Some("  ")), WellStatus::Unreported);
        assert_eq!(WellStatus::Orphaned.to_string(), ORPHANED);
    }
}
