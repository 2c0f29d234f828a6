//! The subset of GeoJSON (RFC 7946) read and written by this crate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A position: longitude, latitude and an optional altitude.
pub type Position = Vec<f64>;

/// Top-level GeoJSON object holding features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    /// Member features.
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_owned()
}

fn feature_type() -> String {
    "Feature".to_owned()
}

impl FeatureCollection {
    /// Wrap `features` in a collection.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
        }
    }
}

/// One feature: a geometry plus free-form properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `"Feature"`.
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    /// Property object; `null` in the file becomes empty.
    #[serde(default, deserialize_with = "nullable_properties")]
    pub properties: Map<String, Value>,
    /// Geometry, absent for unlocated features.
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

fn nullable_properties<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Feature {
    /// A feature with the given geometry and properties.
    #[must_use]
    pub fn new(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_type(),
            properties,
            geometry,
        }
    }
}

/// Geometry variants this crate understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position.
    Point {
        /// `[lon, lat]`.
        coordinates: Position,
    },
    /// A polygon: exterior ring first, then holes.
    Polygon {
        /// Linear rings.
        coordinates: Vec<Vec<Position>>,
    },
    /// Several polygons.
    MultiPolygon {
        /// Polygons, each a list of rings.
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    /// Any other geometry type; its coordinates are ignored.
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// A point at `(longitude, latitude)`.
    #[must_use]
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self::Point {
            coordinates: vec![longitude, latitude],
        }
    }
}

/// Render a property value as table cell text.
///
/// Strings are used verbatim, `null` becomes empty and anything else uses
/// its JSON text.
pub fn property_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
