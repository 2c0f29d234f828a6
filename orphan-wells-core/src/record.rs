//! Well records before and after reconciliation.

use chrono::NaiveDate;
use geo::Coord;

use crate::schema::TargetField;
use crate::state::abbreviation_for;
use crate::status::WellStatus;

/// One observation of a well from one source.
///
/// Coordinates are WGS84 degrees. `source_id` is the identifier issued by
/// the source; it is unique within a source but not across sources.
///
/// # Examples
/// ```
/// use orphan_wells_core::{WellRecord, WellStatus};
///
/// let record = WellRecord::new("3405320001", "Ohio", WellStatus::Orphaned)
///     .with_location(39.5, -81.2)
///     .with_state("Ohio");
///
/// assert_eq!(record.location().map(|c| c.x), Some(-81.2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WellRecord {
    /// Well identifier (usually an API number).
    pub source_id: String,
    /// Name of the configured source the record was read from.
    pub origin: String,
    /// Status, normalized once the record passes the status normalizer.
    pub status: WellStatus,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Full state name.
    pub state: Option<String>,
    /// County or parish.
    pub county: Option<String>,
    /// Well or lease name.
    pub well_name: Option<String>,
    /// Operator of record.
    pub operator: Option<String>,
    /// Date the current status took effect.
    pub status_date: Option<NaiveDate>,
    /// Date drilling started.
    pub spud_date: Option<NaiveDate>,
}

impl WellRecord {
    /// Construct a record with only its identity and status populated.
    pub fn new(
        source_id: impl Into<String>,
        origin: impl Into<String>,
        status: WellStatus,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            origin: origin.into(),
            status,
            latitude: None,
            longitude: None,
            state: None,
            county: None,
            well_name: None,
            operator: None,
            status_date: None,
            spud_date: None,
        }
    }

    /// Set the coordinates.
    #[must_use]
    pub const fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the state name.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Set the well name.
    #[must_use]
    pub fn with_well_name(mut self, name: impl Into<String>) -> Self {
        self.well_name = Some(name.into());
        self
    }

    /// Set the operator.
    #[must_use]
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Set the spud date.
    #[must_use]
    pub const fn with_spud_date(mut self, date: NaiveDate) -> Self {
        self.spud_date = Some(date);
        self
    }

    /// Return the point location with `x = longitude` and `y = latitude`.
    #[must_use]
    pub fn location(&self) -> Option<Coord<f64>> {
        Some(Coord {
            x: self.longitude?,
            y: self.latitude?,
        })
    }

    /// Render a target field as text, as used by composite match keys.
    ///
    /// Dates use ISO 8601. Unreported statuses and absent values yield
    /// `None`.
    pub fn field_text(&self, field: TargetField) -> Option<String> {
        match field {
            TargetField::Identifier => Some(self.source_id.clone()),
            TargetField::Latitude => self.latitude.map(|value| value.to_string()),
            TargetField::Longitude => self.longitude.map(|value| value.to_string()),
            TargetField::State => self.state.clone(),
            TargetField::County => self.county.clone(),
            TargetField::WellName => self.well_name.clone(),
            TargetField::Operator => self.operator.clone(),
            TargetField::Status => match &self.status {
                WellStatus::Unreported => None,
                status => Some(status.as_str().to_owned()),
            },
            TargetField::StatusDate => self.status_date.map(|date| date.to_string()),
            TargetField::SpudDate => self.spud_date.map(|date| date.to_string()),
        }
    }
}

/// How a current record relates to the baseline report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaTag {
    /// Absent from the baseline.
    NewlyOrphaned,
    /// Present in the baseline.
    PreviouslyKnown,
}

impl DeltaTag {
    /// Human-readable label used in exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewlyOrphaned => "newly orphaned",
            Self::PreviouslyKnown => "previously known",
        }
    }
}

/// A record in the unified schema, at most one per `source_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalWellRecord {
    /// The reconciled observation.
    pub well: WellRecord,
    /// Two-letter postal abbreviation derived from the state name.
    pub state_abbrev: Option<&'static str>,
    /// Relation to the baseline, once the set difference has run.
    pub delta: Option<DeltaTag>,
}

impl CanonicalWellRecord {
    /// Return a copy carrying the supplied delta tag.
    #[must_use]
    pub fn tagged(self, tag: DeltaTag) -> Self {
        Self {
            delta: Some(tag),
            ..self
        }
    }

    /// Identifier shared with [`WellRecord::source_id`].
    pub fn source_id(&self) -> &str {
        &self.well.source_id
    }
}

impl From<WellRecord> for CanonicalWellRecord {
    fn from(well: WellRecord) -> Self {
        let state_abbrev = well.state.as_deref().and_then(abbreviation_for);
        Self {
            well,
            state_abbrev,
            delta: None,
        }
    }
}
