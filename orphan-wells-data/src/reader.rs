//! Source file readers producing [`RawTable`]s.
//!
//! CSV and GeoJSON are supported, each optionally bzip2 compressed. Cell
//! text is decoded as UTF-8 with invalid sequences replaced, since several
//! state registries publish Latin-1 exports.

use std::collections::HashMap;
use std::io::{self, BufReader, Read};

use bzip2::read::MultiBzDecoder;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use orphan_wells_core::RawTable;
use orphan_wells_fs::open_utf8_file;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geojson::{FeatureCollection, Geometry, property_text};

/// Column holding a GeoJSON point's longitude.
pub const GEOMETRY_X: &str = "geometry_x";
/// Column holding a GeoJSON point's latitude.
pub const GEOMETRY_Y: &str = "geometry_y";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// File formats a source may be published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A GeoJSON FeatureCollection.
    GeoJson,
}

impl SourceFormat {
    /// Infer the format from the file extension, ignoring a `.bz2` suffix.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use orphan_wells_data::SourceFormat;
    ///
    /// assert_eq!(SourceFormat::detect(Utf8Path::new("wv.csv.bz2")), Some(SourceFormat::Csv));
    /// assert_eq!(SourceFormat::detect(Utf8Path::new("usgs.geojson")), Some(SourceFormat::GeoJson));
    /// assert_eq!(SourceFormat::detect(Utf8Path::new("pa.xlsx")), None);
    /// ```
    #[must_use]
    pub fn detect(path: &Utf8Path) -> Option<Self> {
        let name = path.file_name()?.to_ascii_lowercase();
        let name = name.strip_suffix(".bz2").unwrap_or(&name);
        let extension = name.rsplit_once('.')?.1;
        match extension {
            "csv" | "txt" => Some(Self::Csv),
            "geojson" | "json" => Some(Self::GeoJson),
            _ => None,
        }
    }
}

/// Errors raised while reading a source file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// Neither the manifest nor the extension names a supported format.
    #[error("cannot tell the format of {path}; set `format` to csv or geojson")]
    UnknownFormat { path: Utf8PathBuf },
    /// The CSV reader failed.
    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: Utf8PathBuf,
        #[source]
        source: csv::Error,
    },
    /// The GeoJSON could not be decoded.
    #[error("failed to decode GeoJSON {path}: {source}")]
    GeoJson {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Report whether `path` names a bzip2 archive.
#[must_use]
pub fn is_bz2(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("bz2"))
}

/// Open `path`, transparently decompressing bzip2 archives.
pub fn open_source(path: &Utf8Path) -> Result<Box<dyn Read>, SourceError> {
    let file = open_utf8_file(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    if is_bz2(path) {
        Ok(Box::new(MultiBzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

fn resolve_format(path: &Utf8Path, format: Option<SourceFormat>) -> Result<SourceFormat, SourceError> {
    format
        .or_else(|| SourceFormat::detect(path))
        .ok_or_else(|| SourceError::UnknownFormat {
            path: path.to_path_buf(),
        })
}

/// Read a whole source file.
///
/// # Errors
/// Fails when the file cannot be opened, its format cannot be told, or its
/// content cannot be decoded.
pub fn read_table(path: &Utf8Path, format: Option<SourceFormat>) -> Result<RawTable, SourceError> {
    let table = match resolve_format(path, format)? {
        SourceFormat::Csv => read_csv(path, open_source(path)?)?,
        SourceFormat::GeoJson => read_geojson(path, open_source(path)?)?,
    };
    debug!("{path}: {} rows, {} columns", table.len(), table.headers.len());
    Ok(table)
}

/// Read only the column names of a source file.
///
/// CSV files stop after the header row; GeoJSON has no header, so the
/// whole collection is decoded.
pub fn read_headers(path: &Utf8Path, format: Option<SourceFormat>) -> Result<Vec<String>, SourceError> {
    match resolve_format(path, format)? {
        SourceFormat::Csv => {
            let mut reader = csv_reader(open_source(path)?);
            let headers = reader.byte_headers().map_err(|source| SourceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(decode_headers(headers))
        }
        SourceFormat::GeoJson => Ok(read_geojson(path, open_source(path)?)?.headers),
    }
}

fn csv_reader(reader: Box<dyn Read>) -> csv::Reader<Box<dyn Read>> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

fn decode_headers(headers: &csv::ByteRecord) -> Vec<String> {
    headers
        .iter()
        .map(|field| {
            String::from_utf8_lossy(field)
                .trim_start_matches(BYTE_ORDER_MARK)
                .trim()
                .to_owned()
        })
        .collect()
}

fn read_csv(path: &Utf8Path, reader: Box<dyn Read>) -> Result<RawTable, SourceError> {
    let csv_error = |source: csv::Error| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv_reader(reader);
    let headers = decode_headers(reader.byte_headers().map_err(csv_error)?);
    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(csv_error)?;
        let mut row: Vec<String> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }
    Ok(RawTable::new(headers, rows))
}

fn read_geojson(path: &Utf8Path, reader: impl Read) -> Result<RawTable, SourceError> {
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|source| SourceError::GeoJson {
            path: path.to_path_buf(),
            source,
        })?;

    let mut headers = Vec::new();
    let mut positions = HashMap::new();
    let mut rows = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let point = match &feature.geometry {
            Some(Geometry::Point { coordinates }) => match coordinates.as_slice() {
                [x, y, ..] => Some((*x, *y)),
                _ => None,
            },
            _ => None,
        };
        let mut row = vec![String::new(); headers.len()];
        let properties = feature
            .properties
            .iter()
            .map(|(column, value)| (column.as_str(), property_text(value)));
        let geometry = point.into_iter().flat_map(|(x, y)| {
            [(GEOMETRY_X, x.to_string()), (GEOMETRY_Y, y.to_string())]
        });
        for (column, value) in properties.chain(geometry) {
            let index = column_position(&mut headers, &mut positions, column);
            if index >= row.len() {
                row.resize(index + 1, String::new());
            }
            if let Some(slot) = row.get_mut(index) {
                *slot = value;
            }
        }
        rows.push(row);
    }
    for row in &mut rows {
        row.resize(headers.len(), String::new());
    }
    Ok(RawTable::new(headers, rows))
}

fn column_position(
    headers: &mut Vec<String>,
    positions: &mut HashMap<String, usize>,
    column: &str,
) -> usize {
    if let Some(&index) = positions.get(column) {
        return index;
    }
    headers.push(column.to_owned());
    positions.insert(column.to_owned(), headers.len() - 1);
    headers.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::{Compression, write::BzEncoder};
    use rstest::{fixture, rstest};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        (dir, root)
    }

    const OHIO_CSV: &str = "\u{feff}API,STATUS,LAT,LON\n\
                            3400100001,AB,40.0,-82.0\n\
                            3400100002,PA,40.5\n";

    #[rstest]
    fn reads_csv_and_pads_short_rows(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("ohio.csv");
        fs::write(&path, OHIO_CSV).expect("write csv");

        let table = read_table(&path, None).expect("read csv");
        assert_eq!(table.headers, vec!["API", "STATUS", "LAT", "LON"]);
        assert_eq!(table.rows[1], vec!["3400100002", "PA", "40.5", ""]);
    }

    #[rstest]
    fn replaces_invalid_utf8(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("latin1.csv");
        fs::write(&path, b"API,OPERATOR\n001,Pe\xf1a Oil\n").expect("write csv");

        let table = read_table(&path, None).expect("read csv");
        assert_eq!(table.rows[0][1], "Pe\u{fffd}a Oil");
    }

    #[rstest]
    fn reads_bzip2_compressed_csv(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("ohio.csv.bz2");
        let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(OHIO_CSV.as_bytes()).expect("compress");
        fs::write(&path, encoder.finish().expect("finish")).expect("write archive");

        assert!(is_bz2(&path));
        let table = read_table(&path, None).expect("read archive");
        assert_eq!(table.len(), 2);
        assert_eq!(
            read_headers(&path, None).expect("headers"),
            vec!["API", "STATUS", "LAT", "LON"]
        );
    }

    #[rstest]
    fn reads_geojson_points_into_columns(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("usgs.geojson");
        fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"API": "3400100001"},
                 "geometry": {"type": "Point", "coordinates": [-82.5, 40.25]}},
                {"type": "Feature", "properties": {"API": 3400100002, "NAME": "SMITH 1"},
                 "geometry": null}
            ]}"#,
        )
        .expect("write geojson");

        let table = read_table(&path, None).expect("read geojson");
        assert_eq!(table.headers, vec!["API", GEOMETRY_X, GEOMETRY_Y, "NAME"]);
        assert_eq!(table.rows[0], vec!["3400100001", "-82.5", "40.25", ""]);
        assert_eq!(table.rows[1], vec!["3400100002", "", "", "SMITH 1"]);
    }

    #[rstest]
    fn large_geojson_collections_keep_every_row_aligned(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("baseline.geojson");
        let count = 20_000;
        let mut features: Vec<String> = (0..count)
            .map(|index| {
                format!(
                    r#"{{"type": "Feature", "properties": {{"API": "{index:010}"}},
                     "geometry": {{"type": "Point", "coordinates": [-82.0, 40.0]}}}}"#
                )
            })
            .collect();
        features.push(
            r#"{"type": "Feature", "properties": {"API": "late", "COUNTY": "Noble"}, "geometry": null}"#
                .to_owned(),
        );
        fs::write(
            &path,
            format!(
                r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
                features.join(",")
            ),
        )
        .expect("write geojson");

        let table = read_table(&path, None).expect("read geojson");
        assert_eq!(table.headers, vec!["API", GEOMETRY_X, GEOMETRY_Y, "COUNTY"]);
        assert_eq!(table.len(), count + 1);
        assert!(table.rows.iter().all(|row| row.len() == 4));
        assert_eq!(table.rows[0], vec!["0000000000", "-82", "40", ""]);
        assert_eq!(table.rows[count], vec!["late", "", "", "Noble"]);
    }

    #[rstest]
    fn unknown_extensions_need_an_explicit_format(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("wells.dat");
        fs::write(&path, "API\n001\n").expect("write file");

        let err = read_table(&path, None).expect_err("format is unknown");
        assert!(matches!(err, SourceError::UnknownFormat { .. }));
        let table = read_table(&path, Some(SourceFormat::Csv)).expect("explicit format");
        assert_eq!(table.len(), 1);
    }

    #[rstest]
    fn missing_files_report_their_path(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let path = root.join("absent.csv");
        match read_table(&path, None) {
            Err(SourceError::Open { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
