//! Match keys used to relate records across datasets.
//!
//! Most states publish API numbers that line up with the baseline and the
//! national reference dataset. A few do not, and their wells can only be
//! matched on descriptive fields. A [`MatchPolicy`] picks a
//! [`RecordMatcher`] per state.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::record::WellRecord;
use crate::schema::TargetField;

/// Normalized key under which two records are considered the same well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(Vec<String>);

impl MatchKey {
    /// Build a key from its parts.
    pub fn new(parts: impl IntoIterator<Item = String>) -> Self {
        Self(parts.into_iter().collect())
    }

    /// The key's parts in matcher order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("|"))
    }
}

/// Derives match keys from records.
///
/// Records for which no key can be derived never match anything.
pub trait RecordMatcher: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Key for `record`, or `None` when a required field is absent.
    fn key(&self, record: &WellRecord) -> Option<MatchKey>;
}

/// Matches on the well identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierMatcher;

impl RecordMatcher for IdentifierMatcher {
    fn name(&self) -> &str {
        "identifier"
    }

    fn key(&self, record: &WellRecord) -> Option<MatchKey> {
        let id = record.source_id.trim();
        (!id.is_empty()).then(|| MatchKey(vec![id.to_owned()]))
    }
}

/// Matches on several descriptive fields.
///
/// Text is trimmed, uppercased and has inner whitespace collapsed.
///
/// # Examples
/// ```
/// use orphan_wells_core::{CompositeMatcher, RecordMatcher, WellRecord, WellStatus};
///
/// let matcher = CompositeMatcher::operator_and_name();
/// let state = WellRecord::new("1", "Indiana", WellStatus::Orphaned)
///     .with_operator("Acme Oil")
///     .with_well_name("Smith  1");
/// let reference = WellRecord::new("x", "FracTracker", WellStatus::Plugged)
///     .with_operator(" ACME OIL")
///     .with_well_name("smith 1");
/// assert_eq!(matcher.key(&state), matcher.key(&reference));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeMatcher {
    name: String,
    fields: Vec<TargetField>,
}

impl CompositeMatcher {
    /// Match on `fields`, all of which must be present.
    pub fn new(fields: Vec<TargetField>) -> Self {
        let name = fields
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join("+");
        Self { name, fields }
    }

    /// Well name plus spud date.
    pub fn name_and_spud_date() -> Self {
        Self::new(vec![TargetField::WellName, TargetField::SpudDate])
    }

    /// Operator plus well name.
    pub fn operator_and_name() -> Self {
        Self::new(vec![TargetField::Operator, TargetField::WellName])
    }

    /// Fields the key is built from.
    pub fn fields(&self) -> &[TargetField] {
        &self.fields
    }
}

fn normalise_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then(|| collapsed.to_uppercase())
}

impl RecordMatcher for CompositeMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self, record: &WellRecord) -> Option<MatchKey> {
        if self.fields.is_empty() {
            return None;
        }
        self.fields
            .iter()
            .map(|&field| record.field_text(field).as_deref().and_then(normalise_text))
            .collect::<Option<Vec<_>>>()
            .map(MatchKey)
    }
}

/// Chooses a matcher by the record's state, falling back to a default.
///
/// State names compare case-insensitively.
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    default: Arc<dyn RecordMatcher>,
    by_state: BTreeMap<String, Arc<dyn RecordMatcher>>,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::identifier()
    }
}

impl MatchPolicy {
    /// Use `default` for every state.
    pub fn new(default: Arc<dyn RecordMatcher>) -> Self {
        Self {
            default,
            by_state: BTreeMap::new(),
        }
    }

    /// Match every state on identifiers.
    pub fn identifier() -> Self {
        Self::new(Arc::new(IdentifierMatcher))
    }

    /// Use `matcher` for records from `state`.
    #[must_use]
    pub fn with_state(mut self, state: &str, matcher: Arc<dyn RecordMatcher>) -> Self {
        self.by_state.insert(state.trim().to_lowercase(), matcher);
        self
    }

    /// The matcher responsible for `record`.
    pub fn matcher_for(&self, record: &WellRecord) -> &dyn RecordMatcher {
        record
            .state
            .as_deref()
            .and_then(|state| self.by_state.get(&state.trim().to_lowercase()))
            .map_or(&*self.default, |matcher| &**matcher)
    }

    /// Key of `record` under its state's matcher.
    pub fn key(&self, record: &WellRecord) -> Option<MatchKey> {
        self.matcher_for(record).key(record)
    }

    /// Every matcher the policy can hand out, default first.
    pub fn matchers(&self) -> impl Iterator<Item = &dyn RecordMatcher> {
        std::iter::once(&*self.default).chain(self.by_state.values().map(|matcher| &**matcher))
    }
}

/// Keys of a comparison set under every matcher of a policy.
///
/// Each record of the comparison set is indexed under all matchers, so a
/// lookup only has to derive the probe record's own key.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    keys: HashSet<(String, MatchKey)>,
}

impl KeyIndex {
    /// Index `records` under every matcher in `policy`.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a WellRecord>, policy: &MatchPolicy) -> Self {
        let mut keys = HashSet::new();
        for record in records {
            for matcher in policy.matchers() {
                if let Some(key) = matcher.key(record) {
                    keys.insert((matcher.name().to_owned(), key));
                }
            }
        }
        Self { keys }
    }

    /// Report whether `record`'s key under `policy` is indexed.
    pub fn contains(&self, record: &WellRecord, policy: &MatchPolicy) -> bool {
        let matcher = policy.matcher_for(record);
        matcher
            .key(record)
            .is_some_and(|key| self.keys.contains(&(matcher.name().to_owned(), key)))
    }

    /// Number of indexed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Report whether nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::WellStatus;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    #[fixture]
    fn policy() -> MatchPolicy {
        MatchPolicy::identifier().with_state(
            "Indiana",
            Arc::new(CompositeMatcher::name_and_spud_date()),
        )
    }

    fn spud() -> NaiveDate {
        NaiveDate::from_ymd_opt(1950, 1, 1).expect("valid date")
    }

    #[rstest]
    fn selects_matcher_by_state(policy: MatchPolicy) {
        let indiana = WellRecord::new("1", "Indiana", WellStatus::Orphaned).with_state("INDIANA");
        let ohio = WellRecord::new("1", "Ohio", WellStatus::Orphaned).with_state("Ohio");
        assert_eq!(policy.matcher_for(&indiana).name(), "well_name+spud_date");
        assert_eq!(policy.matcher_for(&ohio).name(), "identifier");
    }

    #[rstest]
    fn composite_keys_need_every_field() {
        let matcher = CompositeMatcher::name_and_spud_date();
        let named = WellRecord::new("1", "Indiana", WellStatus::Orphaned).with_well_name("Smith 1");
        assert_eq!(matcher.key(&named), None);
        let complete = named.with_spud_date(spud());
        assert_eq!(
            matcher.key(&complete),
            Some(MatchKey::new(["SMITH 1".to_owned(), "1950-01-01".to_owned()]))
        );
    }

    #[rstest]
    fn index_matches_across_states(policy: MatchPolicy) {
        let baseline = [
            WellRecord::new("USGS-1", "USGS", WellStatus::Orphaned)
                .with_state("Indiana")
                .with_well_name("SMITH 1")
                .with_spud_date(spud()),
            WellRecord::new("3400100001", "USGS", WellStatus::Orphaned).with_state("Ohio"),
        ];
        let index = KeyIndex::build(&baseline, &policy);

        let indiana = WellRecord::new("1301", "Indiana", WellStatus::Orphaned)
            .with_state("Indiana")
            .with_well_name("smith 1")
            .with_spud_date(spud());
        let ohio = WellRecord::new("3400100001", "Ohio", WellStatus::Orphaned).with_state("Ohio");
        let unknown = WellRecord::new("3400100002", "Ohio", WellStatus::Orphaned).with_state("Ohio");
        assert!(index.contains(&indiana, &policy));
        assert!(index.contains(&ohio, &policy));
        assert!(!index.contains(&unknown, &policy));
    }

    #[rstest]
    fn blank_identifiers_never_match() {
        let record = WellRecord::new("  ", "Ohio", WellStatus::Orphaned);
        assert_eq!(IdentifierMatcher.key(&record), None);
    }
}
