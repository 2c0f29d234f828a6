//! Conversion of unified rows into well records.
//!
//! Cleaning parses coordinates and dates, normalizes identifiers and
//! reprojects positions. Rows that cannot be placed or identified are
//! excluded and counted by reason; cleaning itself never fails.

use std::ops::AddAssign;

use chrono::NaiveDate;
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::identifier::IdentifierFormat;
use crate::record::WellRecord;
use crate::reproject::Reprojection;
use crate::schema::{TargetField, UnifiedRow};
use crate::status::WellStatus;

/// Per-source cleaning configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct CleaningRules {
    /// Identifier normalization.
    pub identifier: IdentifierFormat,
    /// Conversion of the position columns to degrees.
    pub projection: Reprojection,
    /// Force longitudes negative.
    pub western_hemisphere: bool,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            identifier: IdentifierFormat::default(),
            projection: Reprojection::default(),
            western_hemisphere: true,
        }
    }
}

/// Rows excluded during cleaning, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExclusionCounts {
    /// No usable identifier.
    pub missing_identifier: usize,
    /// Latitude or longitude absent.
    pub missing_coordinates: usize,
    /// Coordinates present but not finite numbers in range.
    pub invalid_coordinates: usize,
    /// Latitude or longitude exactly zero.
    pub zero_coordinates: usize,
}

impl ExclusionCounts {
    /// Total rows excluded.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.missing_identifier
            + self.missing_coordinates
            + self.invalid_coordinates
            + self.zero_coordinates
    }
}

impl AddAssign for ExclusionCounts {
    fn add_assign(&mut self, other: Self) {
        self.missing_identifier += other.missing_identifier;
        self.missing_coordinates += other.missing_coordinates;
        self.invalid_coordinates += other.invalid_coordinates;
        self.zero_coordinates += other.zero_coordinates;
    }
}

/// Records produced by [`clean_rows`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanOutcome {
    /// Rows that became records, in input order.
    pub records: Vec<WellRecord>,
    /// Rows that did not.
    pub excluded: ExclusionCounts,
}

enum Rejection {
    MissingIdentifier,
    MissingCoordinates,
    InvalidCoordinates,
    ZeroCoordinates,
}

/// Parse a date written as `YYYY-MM-DD`, `MM/DD/YYYY`, an ISO datetime or a
/// bare year.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use orphan_wells_core::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(1998, 4, 7);
/// assert_eq!(parse_date("1998-04-07"), expected);
/// assert_eq!(parse_date("4/7/1998"), expected);
/// assert_eq!(parse_date("1998-04-07 00:00:00"), expected);
/// assert_eq!(parse_date("1998"), NaiveDate::from_ymd_opt(1998, 1, 1));
/// assert_eq!(parse_date("unknown"), None);
/// ```
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(date);
    }
    if let Some(prefix) = trimmed.get(..10)
        && trimmed
            .get(10..11)
            .is_some_and(|separator| separator == "T" || separator == " ")
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return Some(date);
    }
    if trimmed.len() == 4 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return trimmed
            .parse()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }
    None
}

fn parse_coordinate(text: &str) -> Result<f64, Rejection> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| Rejection::InvalidCoordinates)?;
    if !value.is_finite() {
        return Err(Rejection::InvalidCoordinates);
    }
    if value == 0.0 {
        return Err(Rejection::ZeroCoordinates);
    }
    Ok(value)
}

fn locate(row: &UnifiedRow, rules: &CleaningRules) -> Result<(f64, f64), Rejection> {
    let (Some(lat_text), Some(lon_text)) = (
        row.get(TargetField::Latitude),
        row.get(TargetField::Longitude),
    ) else {
        return Err(Rejection::MissingCoordinates);
    };
    let y = parse_coordinate(lat_text)?;
    let x = parse_coordinate(lon_text)?;
    let coord = rules.projection.apply(x, y);
    if !(-90.0..=90.0).contains(&coord.y) || !(-180.0..=180.0).contains(&coord.x) {
        return Err(Rejection::InvalidCoordinates);
    }
    let longitude = if rules.western_hemisphere {
        -coord.x.abs()
    } else {
        coord.x
    };
    Ok((coord.y, longitude))
}

/// State a row is filed under: the configured state, else its own column.
pub(crate) fn row_state(state: Option<&str>, row: &UnifiedRow) -> Option<String> {
    state.or_else(|| row.get(TargetField::State)).map(str::to_owned)
}

fn clean_row(
    origin: &str,
    state: Option<&str>,
    row: &UnifiedRow,
    rules: &CleaningRules,
) -> Result<WellRecord, Rejection> {
    let (latitude, longitude) = locate(row, rules)?;
    let source_id = row
        .get(TargetField::Identifier)
        .and_then(|raw| rules.identifier.normalise(raw))
        .ok_or(Rejection::MissingIdentifier)?;

    let text = |field: TargetField| row.get(field).map(str::to_owned);
    let mut record = WellRecord::new(
        source_id,
        origin,
        WellStatus::from_raw(row.get(TargetField::Status)),
    )
    .with_location(latitude, longitude);
    record.state = row_state(state, row);
    record.county = text(TargetField::County);
    record.well_name = text(TargetField::WellName);
    record.operator = text(TargetField::Operator);
    record.status_date = row.get(TargetField::StatusDate).and_then(parse_date);
    record.spud_date = row.get(TargetField::SpudDate).and_then(parse_date);
    Ok(record)
}

/// Turn unified rows from `origin` into well records.
///
/// `state` overrides any state column the source carries.
pub fn clean_rows(
    origin: &str,
    state: Option<&str>,
    rows: &[UnifiedRow],
    rules: &CleaningRules,
) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();
    for row in rows {
        match clean_row(origin, state, row, rules) {
            Ok(record) => outcome.records.push(record),
            Err(Rejection::MissingIdentifier) => outcome.excluded.missing_identifier += 1,
            Err(Rejection::MissingCoordinates) => outcome.excluded.missing_coordinates += 1,
            Err(Rejection::InvalidCoordinates) => outcome.excluded.invalid_coordinates += 1,
            Err(Rejection::ZeroCoordinates) => outcome.excluded.zero_coordinates += 1,
        }
    }
    if outcome.excluded.total() > 0 {
        debug!(
            "{origin}: excluded {} of {} rows ({:?})",
            outcome.excluded.total(),
            rows.len(),
            outcome.excluded
        );
    }
    outcome
}
