//! GeoJSON and JSON artefacts written at the end of a run.

use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use orphan_wells_core::{CanonicalWellRecord, RunSummary};
use orphan_wells_fs::create_utf8_file;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geojson::{Feature, FeatureCollection, Geometry};

/// Errors raised while writing artefacts.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The file or its parent directory could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Serializing or writing the content failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Flushing the file failed.
    #[error("failed to flush {path}: {source}")]
    Flush {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Feature properties of one exported well.
#[derive(Debug, Serialize)]
struct WellProperties<'a> {
    api_10: &'a str,
    state: Option<&'a str>,
    st_abbrev: Option<&'a str>,
    county: Option<&'a str>,
    well_name: Option<&'a str>,
    operator: Option<&'a str>,
    well_status: Option<&'a str>,
    status_date: Option<String>,
    spud_date: Option<String>,
    delta_status: Option<&'static str>,
}

impl<'a> WellProperties<'a> {
    fn of(record: &'a CanonicalWellRecord) -> Self {
        let well = &record.well;
        Self {
            api_10: &well.source_id,
            state: well.state.as_deref(),
            st_abbrev: record.state_abbrev,
            county: well.county.as_deref(),
            well_name: well.well_name.as_deref(),
            operator: well.operator.as_deref(),
            well_status: Some(well.status.as_str()).filter(|status| !status.is_empty()),
            status_date: well.status_date.map(|date| date.to_string()),
            spud_date: well.spud_date.map(|date| date.to_string()),
            delta_status: record.delta.map(|tag| tag.as_str()),
        }
    }
}

/// Build the GeoJSON feature for `record`.
///
/// Records without coordinates get a `null` geometry.
pub fn well_feature(record: &CanonicalWellRecord) -> Feature {
    let geometry = record
        .well
        .location()
        .map(|coord| Geometry::point(coord.x, coord.y));
    let properties = match serde_json::to_value(WellProperties::of(record)) {
        Ok(Value::Object(properties)) => properties,
        _ => Map::new(),
    };
    Feature::new(geometry, properties)
}

fn write_json<T: Serialize>(path: &Utf8Path, value: &T, pretty: bool) -> Result<(), ExportError> {
    let file = create_utf8_file(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, value)
    } else {
        serde_json::to_writer(&mut writer, value)
    };
    written.map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| ExportError::Flush {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `records` as a GeoJSON point FeatureCollection.
///
/// Missing parent directories are created. Returns the number of features
/// written.
///
/// # Errors
/// Fails when the file cannot be created or written.
pub fn write_geojson(path: &Utf8Path, records: &[CanonicalWellRecord]) -> Result<usize, ExportError> {
    let collection = FeatureCollection::new(records.iter().map(well_feature).collect());
    write_json(path, &collection, false)?;
    info!("wrote {} wells to {path}", records.len());
    Ok(records.len())
}

/// Write the run summary as pretty-printed JSON.
///
/// # Errors
/// Fails when the file cannot be created or written.
pub fn write_summary(path: &Utf8Path, summary: &RunSummary) -> Result<(), ExportError> {
    write_json(path, summary, true)?;
    info!("wrote run summary to {path}");
    Ok(())
}
