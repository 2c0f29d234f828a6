//! State boundary polygons loaded from a GeoJSON FeatureCollection.

use camino::{Utf8Path, Utf8PathBuf};
use geo::{LineString, MultiPolygon, Polygon};
use log::{debug, info};
use orphan_wells_core::StateBoundaries;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geojson::{FeatureCollection, Geometry, Position, property_text};
use crate::reader::{SourceError, open_source};

/// Property naming the state abbreviation in Census TIGER state files.
pub const DEFAULT_STATE_PROPERTY: &str = "STUSPS";

/// Where to find state boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundarySpec {
    /// GeoJSON file of state polygons.
    pub path: Utf8PathBuf,
    /// Feature property holding the postal abbreviation.
    #[serde(default = "default_state_property")]
    pub property: String,
}

fn default_state_property() -> String {
    DEFAULT_STATE_PROPERTY.to_owned()
}

impl BoundarySpec {
    /// Boundaries at `path` keyed by [`DEFAULT_STATE_PROPERTY`].
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            property: default_state_property(),
        }
    }
}

/// Errors raised while loading state boundaries.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The file could not be opened or decoded.
    #[error("failed to read state boundaries: {0}")]
    Read(#[from] SourceError),
    /// A feature lacks the abbreviation property.
    #[error("feature {index} in {path} has no {property:?} property")]
    MissingProperty {
        path: Utf8PathBuf,
        property: String,
        index: usize,
    },
}

fn ring(positions: &[Position]) -> LineString<f64> {
    positions
        .iter()
        .filter_map(|position| match position.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .into()
}

fn polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        ring(exterior),
        interiors.iter().map(|interior| ring(interior)).collect(),
    ))
}

fn multipolygon(geometry: &Geometry) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon { coordinates } => {
            Some(MultiPolygon(polygon(coordinates).into_iter().collect()))
        }
        Geometry::MultiPolygon { coordinates } => Some(MultiPolygon(
            coordinates.iter().filter_map(|rings| polygon(rings)).collect(),
        )),
        Geometry::Point { .. } | Geometry::Unsupported => None,
    }
}

/// Load state polygons keyed by the abbreviation in `spec.property`.
///
/// Features without polygon geometry are skipped. Several features for
/// one state are merged.
///
/// # Errors
/// Fails when the file cannot be read or a feature lacks the property.
pub fn load_state_boundaries(spec: &BoundarySpec) -> Result<StateBoundaries, BoundaryError> {
    let path: &Utf8Path = &spec.path;
    let reader = open_source(path)?;
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|source| SourceError::GeoJson {
            path: path.to_path_buf(),
            source,
        })?;

    let mut boundaries = StateBoundaries::default();
    for (index, feature) in collection.features.iter().enumerate() {
        let abbrev = feature
            .properties
            .get(&spec.property)
            .map(property_text)
            .filter(|abbrev| !abbrev.trim().is_empty())
            .ok_or_else(|| BoundaryError::MissingProperty {
                path: path.to_path_buf(),
                property: spec.property.clone(),
                index,
            })?;
        match feature.geometry.as_ref().and_then(multipolygon) {
            Some(shape) => boundaries.insert(abbrev.trim(), shape),
            None => debug!("{path}: feature {index} ({abbrev}) has no polygon geometry"),
        }
    }
    info!("loaded boundaries for {} states from {path}", boundaries.len());
    Ok(boundaries)
}
