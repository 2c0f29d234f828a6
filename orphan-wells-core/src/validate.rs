//! Point-in-state validation.
//!
//! Registries occasionally publish swapped, truncated or mis-projected
//! coordinates. A record survives validation only when its point lies inside
//! the boundary of the state it claims.

use std::collections::{BTreeMap, HashMap};

use geo::{Contains, MultiPolygon, Point};
use log::{debug, info};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::record::CanonicalWellRecord;

/// Supplies state boundary polygons keyed by postal abbreviation.
pub trait BoundaryProvider {
    /// Boundary of the state with abbreviation `abbrev`, if known.
    fn boundary(&self, abbrev: &str) -> Option<&MultiPolygon<f64>>;
}

/// In-memory boundaries keyed by upper-case postal abbreviation.
///
/// # Examples
/// ```
/// use geo::{polygon, MultiPolygon};
/// use orphan_wells_core::{BoundaryProvider, StateBoundaries};
///
/// let square = polygon![(x: -81.0, y: 39.0), (x: -80.0, y: 39.0), (x: -80.0, y: 40.0), (x: -81.0, y: 40.0)];
/// let boundaries = StateBoundaries::default().with_state("oh", MultiPolygon(vec![square]));
/// assert!(boundaries.boundary("OH").is_some());
/// assert!(boundaries.boundary("WV").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBoundaries {
    states: HashMap<String, MultiPolygon<f64>>,
}

impl StateBoundaries {
    /// Add or replace a state's boundary.
    #[must_use]
    pub fn with_state(mut self, abbrev: &str, boundary: MultiPolygon<f64>) -> Self {
        self.insert(abbrev, boundary);
        self
    }

    /// Add a boundary, merging with any polygons already held for the state.
    pub fn insert(&mut self, abbrev: &str, boundary: MultiPolygon<f64>) {
        self.states
            .entry(abbrev.trim().to_uppercase())
            .or_insert_with(|| MultiPolygon(Vec::new()))
            .0
            .extend(boundary);
    }

    /// Number of states with a boundary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Report whether no boundary is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl BoundaryProvider for StateBoundaries {
    fn boundary(&self, abbrev: &str) -> Option<&MultiPolygon<f64>> {
        self.states.get(&abbrev.trim().to_uppercase())
    }
}

/// Outcome of checking one record against its claimed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    /// The point lies inside the boundary.
    Inside,
    /// The point lies outside the boundary.
    Outside,
    /// The record has no coordinates.
    NoLocation,
    /// The record claims no state, or its state has no boundary.
    NoBoundary,
}

/// Check `record`'s point against its claimed state's boundary.
pub fn containment<P: BoundaryProvider + ?Sized>(
    record: &CanonicalWellRecord,
    provider: &P,
) -> Containment {
    let Some(location) = record.well.location() else {
        return Containment::NoLocation;
    };
    let Some(boundary) = record
        .state_abbrev
        .and_then(|abbrev| provider.boundary(abbrev))
    else {
        return Containment::NoBoundary;
    };
    if boundary.contains(&Point::from(location)) {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Records rejected by [`retain_within_claimed_state`], by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ValidationReport {
    /// Points outside their state.
    pub outside: usize,
    /// Records without coordinates.
    pub no_location: usize,
    /// Records whose state has no boundary.
    pub no_boundary: usize,
}

impl ValidationReport {
    /// Total records rejected.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.outside + self.no_location + self.no_boundary
    }
}

/// Records after validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validated {
    /// Records inside their claimed state.
    pub records: Vec<CanonicalWellRecord>,
    /// Rejections overall.
    pub report: ValidationReport,
    /// Points outside their state, keyed by state name.
    pub outside_by_state: BTreeMap<String, usize>,
}

/// Keep only records whose point lies inside their claimed state.
pub fn retain_within_claimed_state<P: BoundaryProvider + ?Sized>(
    records: Vec<CanonicalWellRecord>,
    provider: &P,
) -> Validated {
    let mut validated = Validated::default();
    for record in records {
        match containment(&record, provider) {
            Containment::Inside => validated.records.push(record),
            Containment::Outside => {
                debug!(
                    "well {} lies outside {}",
                    record.source_id(),
                    record.well.state.as_deref().unwrap_or("its state")
                );
                validated.report.outside += 1;
                *validated
                    .outside_by_state
                    .entry(record.well.state.clone().unwrap_or_default())
                    .or_default() += 1;
            }
            Containment::NoLocation => validated.report.no_location += 1,
            Containment::NoBoundary => validated.report.no_boundary += 1,
        }
    }
    info!(
        "{} wells inside their claimed state, {} rejected",
        validated.records.len(),
        validated.report.rejected()
    );
    validated
}
