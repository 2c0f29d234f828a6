//! Projection of source tables onto the unified well schema.
//!
//! Sources are read into [`RawTable`]s: a header row plus string cells. A
//! [`FieldMapping`] names, for each [`TargetField`], the column (or columns)
//! holding that value. [`unify`] applies the mapping row by row and never
//! fails; fields without a mapping, or whose column is absent, are null.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A field of the unified well schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TargetField {
    /// Well identifier (API number).
    #[cfg_attr(feature = "serde", serde(rename = "api_10"))]
    Identifier,
    /// Latitude, or northing for projected sources.
    #[cfg_attr(feature = "serde", serde(rename = "lat"))]
    Latitude,
    /// Longitude, or easting for projected sources.
    #[cfg_attr(feature = "serde", serde(rename = "lon"))]
    Longitude,
    /// State name.
    #[cfg_attr(feature = "serde", serde(rename = "state"))]
    State,
    /// County or parish.
    #[cfg_attr(feature = "serde", serde(rename = "county"))]
    County,
    /// Well or lease name.
    #[cfg_attr(feature = "serde", serde(rename = "well_name"))]
    WellName,
    /// Operator of record.
    #[cfg_attr(feature = "serde", serde(rename = "operator"))]
    Operator,
    /// Raw status text.
    #[cfg_attr(feature = "serde", serde(rename = "well_status"))]
    Status,
    /// Date of the current status.
    #[cfg_attr(feature = "serde", serde(rename = "status_date"))]
    StatusDate,
    /// Spud date.
    #[cfg_attr(feature = "serde", serde(rename = "spud_date"))]
    SpudDate,
}

const FIELD_COUNT: usize = 10;

impl TargetField {
    /// Every target field in schema order.
    pub const ALL: [Self; FIELD_COUNT] = [
        Self::Identifier,
        Self::Latitude,
        Self::Longitude,
        Self::State,
        Self::County,
        Self::WellName,
        Self::Operator,
        Self::Status,
        Self::StatusDate,
        Self::SpudDate,
    ];

    /// Column name used for the field in exports and manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identifier => "api_10",
            Self::Latitude => "lat",
            Self::Longitude => "lon",
            Self::State => "state",
            Self::County => "county",
            Self::WellName => "well_name",
            Self::Operator => "operator",
            Self::Status => "well_status",
            Self::StatusDate => "status_date",
            Self::SpudDate => "spud_date",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Identifier => 0,
            Self::Latitude => 1,
            Self::Longitude => 2,
            Self::State => 3,
            Self::County => 4,
            Self::WellName => 5,
            Self::Operator => 6,
            Self::Status => 7,
            Self::StatusDate => 8,
            Self::SpudDate => 9,
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The source column(s) a target field is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum ColumnSource {
    /// A single column.
    Single(String),
    /// Several columns whose non-null values are joined with a space.
    Joined(Vec<String>),
}

impl ColumnSource {
    /// Iterate over the referenced column names.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        let columns: &[String] = match self {
            Self::Single(column) => std::slice::from_ref(column),
            Self::Joined(columns) => columns,
        };
        columns.iter().map(String::as_str)
    }
}

impl From<&str> for ColumnSource {
    fn from(column: &str) -> Self {
        Self::Single(column.to_owned())
    }
}

/// Errors returned by [`FieldMapping::validate_columns`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldMappingError {
    /// Mapped columns are absent from the source header.
    #[error("mapped columns not found in source header: {}", columns.join(", "))]
    MissingColumns {
        /// Every mapped column that the header lacks.
        columns: Vec<String>,
    },
}

/// Target field to source column mapping for one source.
///
/// # Examples
/// ```
/// use orphan_wells_core::{FieldMapping, TargetField};
///
/// let mapping = FieldMapping::default()
///     .with(TargetField::Identifier, "API_NO")
///     .with(TargetField::Status, "WELL_STATUS");
/// assert!(mapping.validate_columns(&["API_NO", "WELL_STATUS"]).is_ok());
/// assert!(mapping.validate_columns(&["API"]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct FieldMapping(BTreeMap<TargetField, ColumnSource>);

impl FieldMapping {
    /// Map `field` to `column`, replacing any earlier entry.
    #[must_use]
    pub fn with(mut self, field: TargetField, column: impl Into<ColumnSource>) -> Self {
        self.0.insert(field, column.into());
        self
    }

    /// Return the columns mapped to `field`, if any.
    pub fn get(&self, field: TargetField) -> Option<&ColumnSource> {
        self.0.get(&field)
    }

    /// Check every mapped column against a source header.
    ///
    /// # Errors
    /// Returns [`FieldMappingError::MissingColumns`] listing each absent
    /// column in mapping order.
    pub fn validate_columns<S: AsRef<str>>(&self, headers: &[S]) -> Result<(), FieldMappingError> {
        let columns: Vec<String> = self
            .0
            .values()
            .flat_map(ColumnSource::columns)
            .filter(|column| !headers.iter().any(|header| header.as_ref() == *column))
            .map(str::to_owned)
            .collect();
        if columns.is_empty() {
            Ok(())
        } else {
            Err(FieldMappingError::MissingColumns { columns })
        }
    }
}

/// Header row plus string rows as read from a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names.
    pub headers: Vec<String>,
    /// Cell values; rows shorter than the header are padded with nulls.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a table from headers and rows.
    pub const fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of `column` in the header.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == column)
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Report whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append `other`, aligning its columns by header name.
    ///
    /// Columns unknown to `self` are added; rows lacking a column get an
    /// empty cell.
    pub fn append(&mut self, other: Self) {
        let previous_width = self.headers.len();
        let positions: Vec<usize> = other
            .headers
            .iter()
            .map(|header| {
                self.column_index(header).unwrap_or_else(|| {
                    self.headers.push(header.clone());
                    self.headers.len() - 1
                })
            })
            .collect();
        let width = self.headers.len();
        if width > previous_width {
            for row in &mut self.rows {
                row.resize(width, String::new());
            }
        }
        for row in other.rows {
            let mut aligned = vec![String::new(); width];
            for (value, &position) in row.into_iter().zip(&positions) {
                if let Some(slot) = aligned.get_mut(position) {
                    *slot = value;
                }
            }
            self.rows.push(aligned);
        }
    }

    /// Keep only the rows accepted by every filter.
    ///
    /// Filters naming a column the table lacks reject nothing.
    #[must_use]
    pub fn filter_rows(mut self, filters: &[RowFilter]) -> Self {
        let resolved: Vec<(usize, &RowFilter)> = filters
            .iter()
            .filter_map(|filter| Some((self.column_index(&filter.column)?, filter)))
            .collect();
        self.rows.retain(|row| {
            resolved
                .iter()
                .all(|(index, filter)| filter.accepts(cell_text(row, *index)))
        });
        self
    }
}

/// Return the trimmed cell text, treating empty cells and `nan` as null.
fn cell_text(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty() && !cell.eq_ignore_ascii_case("nan"))
}

/// Keeps or drops rows by the value of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(deny_unknown_fields)
)]
pub struct RowFilter {
    /// Column inspected.
    pub column: String,
    /// When non-empty, only these values are kept.
    #[cfg_attr(feature = "serde", serde(default))]
    pub include: Vec<String>,
    /// Values that drop the row.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude: Vec<String>,
}

impl RowFilter {
    fn accepts(&self, value: Option<&str>) -> bool {
        let value = value.unwrap_or_default();
        let listed = |values: &[String]| values.iter().any(|entry| entry.trim() == value);
        (self.include.is_empty() || listed(&self.include)) && !listed(&self.exclude)
    }
}

/// One source row projected onto the target schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedRow {
    values: [Option<String>; FIELD_COUNT],
}

impl UnifiedRow {
    /// Value of `field`, or `None` when the source lacks it.
    pub fn get(&self, field: TargetField) -> Option<&str> {
        self.values
            .get(field.slot())
            .and_then(Option::as_deref)
    }

    /// Set the value of `field`.
    pub fn set(&mut self, field: TargetField, value: Option<String>) {
        if let Some(slot) = self.values.get_mut(field.slot()) {
            *slot = value;
        }
    }
}

/// Project every row of `table` onto the target schema.
///
/// Unknown columns and unmapped fields yield null values.
///
/// # Examples
/// ```
/// use orphan_wells_core::{FieldMapping, RawTable, TargetField, unify};
///
/// let table = RawTable::new(
///     vec!["API".into(), "STATUS".into()],
///     vec![vec!["001".into(), "AB".into()]],
/// );
/// let mapping = FieldMapping::default()
///     .with(TargetField::Identifier, "API")
///     .with(TargetField::County, "COUNTY");
/// let rows = unify(&table, &mapping);
/// assert_eq!(rows[0].get(TargetField::Identifier), Some("001"));
/// assert_eq!(rows[0].get(TargetField::County), None);
/// assert_eq!(rows[0].get(TargetField::Status), None);
/// ```
pub fn unify(table: &RawTable, mapping: &FieldMapping) -> Vec<UnifiedRow> {
    let resolved: Vec<(TargetField, Vec<usize>)> = TargetField::ALL
        .iter()
        .filter_map(|&field| {
            let source = mapping.get(field)?;
            let indices: Vec<usize> = source
                .columns()
                .filter_map(|column| table.column_index(column))
                .collect();
            Some((field, indices))
        })
        .collect();

    table
        .rows
        .iter()
        .map(|row| {
            let mut unified = UnifiedRow::default();
            for (field, indices) in &resolved {
                let parts: Vec<&str> = indices
                    .iter()
                    .filter_map(|&index| cell_text(row, index))
                    .collect();
                if !parts.is_empty() {
                    unified.set(*field, Some(parts.join(" ")));
                }
            }
            unified
        })
        .collect()
}
