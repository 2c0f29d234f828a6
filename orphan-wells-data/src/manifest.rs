//! The TOML manifest describing a reconciliation run.
//!
//! A manifest lists three groups of sources (`[[current]]`, `[[reference]]`
//! and `[[baseline]]`), each with its files, column mapping, status
//! vocabulary and cleaning rules, plus run-wide settings and match
//! policies. File paths are resolved against the manifest's directory.
//!
//! ```toml
//! [settings]
//! sentinel_prefixes = ["ID", "D"]
//! current_duplicates = "drop-all"
//!
//! [matching.baseline.states]
//! Indiana = { fields = ["well_name", "spud_date"] }
//!
//! [[current]]
//! name = "Ohio"
//! state = "Ohio"
//! files = ["ohio/orphans.csv"]
//! fields = { api_10 = "API", well_status = "STATUS", lat = "LAT", lon = "LON" }
//! statuses = { orphaned = ["AB"], plugged = ["PA"] }
//!
//! [[reference]]
//! name = "FracTracker"
//! files = ["fractracker.csv"]
//! fields = { api_10 = "API", well_status = "STATUS", state = "STUSPS" }
//!
//! [reference.statuses_by_state]
//! Utah = { plugged = ["PA"] }
//! # A value listed as both orphaned and plugged is rejected. Where a
//! # registry uses one label for both, list it as orphaned only.
//! "South Dakota" = { orphaned = ["Abandoned-Not Regulated"], plugged = ["Plugged and Abandoned"] }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use orphan_wells_core::{
    BoundaryProvider, CleaningRules, CompositeMatcher, DuplicatePolicy, FieldMapping,
    FieldMappingError, IdentifierMatcher, MatchPolicy, RawTable, ReconcileInput, Reconciler,
    RecordMatcher, RowFilter, SourceBatch, StatusNormalizer, StatusTable, StatusTableError,
    TargetField, WellStatus,
};
use orphan_wells_fs::{open_utf8_file, resolve_against};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boundaries::BoundarySpec;
use crate::reader::{SourceError, SourceFormat, read_headers, read_table};

/// Errors raised while loading or applying a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The manifest is not valid TOML or does not match the schema.
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    /// No `[[current]]` source is configured.
    #[error("manifest {path} declares no [[current]] sources")]
    NoCurrentSources { path: Utf8PathBuf },
    /// Two sources share a name.
    #[error("source name {name:?} is used more than once")]
    DuplicateSource { name: String },
    /// A source lists no files.
    #[error("source {name:?} lists no files")]
    NoFiles { name: String },
    /// A source declares both a status table and a fixed status.
    #[error("source {name:?} combines `fixed_status` with a status table")]
    ConflictingStatusRules { name: String },
    /// A source's status table is invalid.
    #[error("source {name:?} has an invalid status table: {source}")]
    StatusTable {
        name: String,
        #[source]
        source: StatusTableError,
    },
    /// A composite matcher names no fields.
    #[error("the {scope} matcher lists no fields")]
    EmptyMatcher { scope: String },
    /// A source file could not be read.
    #[error("source {name:?}: {source}")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },
    /// A source's column mapping does not fit its files.
    #[error("source {name:?} ({path}): {source}")]
    Mapping {
        name: String,
        path: Utf8PathBuf,
        #[source]
        source: FieldMappingError,
    },
}

/// Run-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Baseline identifier prefixes marking placeholder identifiers.
    pub sentinel_prefixes: Vec<String>,
    /// Duplicate handling for the current registries.
    pub current_duplicates: DuplicatePolicy,
    /// Duplicate handling for the reference dataset.
    pub reference_duplicates: DuplicatePolicy,
}

/// How one state's records derive their match key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherSpec {
    /// Match on the well identifier.
    #[default]
    Identifier,
    /// Match on several normalized fields.
    Fields(Vec<TargetField>),
}

impl MatcherSpec {
    fn build(&self, scope: &str) -> Result<Arc<dyn RecordMatcher>, ManifestError> {
        match self {
            Self::Identifier => Ok(Arc::new(IdentifierMatcher)),
            Self::Fields(fields) if fields.is_empty() => Err(ManifestError::EmptyMatcher {
                scope: scope.to_owned(),
            }),
            Self::Fields(fields) => Ok(Arc::new(CompositeMatcher::new(fields.clone()))),
        }
    }
}

/// A default matcher plus per-state overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingSpec {
    /// Matcher for states without an override.
    pub default: MatcherSpec,
    /// Overrides keyed by state name.
    pub states: BTreeMap<String, MatcherSpec>,
}

impl MatchingSpec {
    fn policy(&self, group: &str) -> Result<MatchPolicy, ManifestError> {
        let default = self.default.build(&format!("{group} default"))?;
        self.states
            .iter()
            .try_fold(MatchPolicy::new(default), |policy, (state, spec)| {
                let matcher = spec.build(&format!("{group} {state}"))?;
                Ok(policy.with_state(state, matcher))
            })
    }
}

/// Match policies for the two comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Matching {
    /// Current records against the baseline.
    pub baseline: MatchingSpec,
    /// Current and baseline records against the reference dataset.
    pub reference: MatchingSpec,
}

/// A source's status vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusSpec {
    /// Raw values meaning orphaned.
    pub orphaned: Vec<String>,
    /// Raw values meaning plugged.
    pub plugged: Vec<String>,
}

/// One configured source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    /// Unique source name.
    pub name: String,
    /// State every row belongs to.
    #[serde(default)]
    pub state: Option<String>,
    /// Files concatenated into the source, relative to the manifest.
    pub files: Vec<Utf8PathBuf>,
    /// File format, inferred from the extension when absent.
    #[serde(default)]
    pub format: Option<SourceFormat>,
    /// Target field to column mapping.
    pub fields: FieldMapping,
    /// Status vocabulary.
    #[serde(default)]
    pub statuses: Option<StatusSpec>,
    /// Status vocabularies for rows of one state, keyed by state name or
    /// abbreviation. They take precedence over `statuses`.
    #[serde(default)]
    pub statuses_by_state: BTreeMap<String, StatusSpec>,
    /// Status assigned to every row.
    #[serde(default)]
    pub fixed_status: Option<String>,
    /// Row filters.
    #[serde(default)]
    pub filters: Vec<RowFilter>,
    /// Identifier, coordinate and hemisphere rules.
    #[serde(default)]
    pub cleaning: CleaningRules,
}

impl SourceSpec {
    fn register(&self, normalizer: StatusNormalizer) -> Result<StatusNormalizer, ManifestError> {
        let tabled = self.statuses.is_some() || !self.statuses_by_state.is_empty();
        let normalizer = match (&self.fixed_status, &self.statuses) {
            (Some(_), _) if tabled => {
                return Err(ManifestError::ConflictingStatusRules {
                    name: self.name.clone(),
                });
            }
            (Some(status), _) => normalizer
                .with_fixed_status(self.name.clone(), WellStatus::from_raw(Some(status))),
            (None, Some(statuses)) => {
                normalizer.with_table(self.name.clone(), self.status_table(statuses)?)
            }
            (None, None) => normalizer,
        };
        self.statuses_by_state
            .iter()
            .try_fold(normalizer, |normalizer, (state, statuses)| {
                let table = self.status_table(statuses)?;
                Ok(normalizer.with_state_table(self.name.clone(), state, table))
            })
    }

    fn status_table(&self, statuses: &StatusSpec) -> Result<StatusTable, ManifestError> {
        StatusTable::new(&statuses.orphaned, &statuses.plugged).map_err(|source| {
            ManifestError::StatusTable {
                name: self.name.clone(),
                source,
            }
        })
    }

    fn source_error(&self, source: SourceError) -> ManifestError {
        ManifestError::Source {
            name: self.name.clone(),
            source,
        }
    }

    fn mapping_error(&self, path: &Utf8Path, source: FieldMappingError) -> ManifestError {
        ManifestError::Mapping {
            name: self.name.clone(),
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The group a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    /// A current state registry.
    Current,
    /// The national reference dataset.
    Reference,
    /// The baseline report.
    Baseline,
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Current => "current",
            Self::Reference => "reference",
            Self::Baseline => "baseline",
        })
    }
}

/// Outcome of a trial header parse for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCheck {
    /// Group of the source.
    pub role: SourceRole,
    /// Source name.
    pub name: String,
    /// Resolved file paths.
    pub files: Vec<Utf8PathBuf>,
    /// Distinct columns across the files.
    pub columns: usize,
}

/// Source tables read from disk, ready for a [`Reconciler`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSources {
    /// Current registries.
    pub current: Vec<SourceBatch>,
    /// Reference dataset.
    pub reference: Vec<SourceBatch>,
    /// Baseline report.
    pub baseline: Vec<SourceBatch>,
}

impl LoadedSources {
    /// Pipeline input using `boundaries` for validation.
    #[must_use]
    pub fn into_input<'a>(
        self,
        boundaries: Option<&'a dyn BoundaryProvider>,
    ) -> ReconcileInput<'a> {
        ReconcileInput {
            current: self.current,
            reference: self.reference,
            baseline: self.baseline,
            boundaries,
        }
    }
}

fn with_role(
    role: SourceRole,
    sources: &[SourceSpec],
) -> impl Iterator<Item = (SourceRole, &SourceSpec)> {
    sources.iter().map(move |source| (role, source))
}

/// A parsed and validated manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Run-wide settings.
    #[serde(default)]
    pub settings: Settings,
    /// Match policies.
    #[serde(default)]
    pub matching: Matching,
    /// State boundaries for geographic validation.
    #[serde(default)]
    pub boundaries: Option<BoundarySpec>,
    /// Current state registries.
    #[serde(default)]
    pub current: Vec<SourceSpec>,
    /// National reference dataset.
    #[serde(default)]
    pub reference: Vec<SourceSpec>,
    /// Baseline report.
    #[serde(default)]
    pub baseline: Vec<SourceSpec>,
    #[serde(skip)]
    root: Utf8PathBuf,
}

impl Manifest {
    /// Read and validate the manifest at `path`.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed, or fails validation.
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        let read_error = |source: io::Error| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut text = String::new();
        open_utf8_file(path)
            .map_err(read_error)?
            .read_to_string(&mut text)
            .map_err(read_error)?;
        Self::from_toml(&text, path)
    }

    /// Parse and validate manifest text as if read from `path`.
    ///
    /// # Errors
    /// Fails when the text does not parse or fails validation.
    pub fn from_toml(text: &str, path: &Utf8Path) -> Result<Self, ManifestError> {
        let mut manifest: Self = toml::from_str(text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        manifest.root = path
            .parent()
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf);
        if manifest.current.is_empty() {
            return Err(ManifestError::NoCurrentSources {
                path: path.to_path_buf(),
            });
        }
        let mut names = BTreeSet::new();
        for (_, source) in manifest.sources() {
            if !names.insert(source.name.as_str()) {
                return Err(ManifestError::DuplicateSource {
                    name: source.name.clone(),
                });
            }
            if source.files.is_empty() {
                return Err(ManifestError::NoFiles {
                    name: source.name.clone(),
                });
            }
        }
        manifest.reconciler()?;
        Ok(manifest)
    }

    /// Directory that relative paths are resolved against.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Resolve a manifest-relative path.
    #[must_use]
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        resolve_against(&self.root, path)
    }

    /// Every source with its group, in manifest order.
    pub fn sources(&self) -> impl Iterator<Item = (SourceRole, &SourceSpec)> {
        with_role(SourceRole::Current, &self.current)
            .chain(with_role(SourceRole::Reference, &self.reference))
            .chain(with_role(SourceRole::Baseline, &self.baseline))
    }

    /// Build the pipeline configuration.
    ///
    /// # Errors
    /// Fails on invalid status tables or empty composite matchers.
    pub fn reconciler(&self) -> Result<Reconciler, ManifestError> {
        let normalizer = self
            .sources()
            .try_fold(StatusNormalizer::default(), |normalizer, (_, source)| {
                source.register(normalizer)
            })?;
        Ok(Reconciler {
            normalizer,
            current_duplicates: self.settings.current_duplicates,
            reference_duplicates: self.settings.reference_duplicates,
            baseline_matching: self.matching.baseline.policy("baseline")?,
            reference_matching: self.matching.reference.policy("reference")?,
            sentinel_prefixes: self.settings.sentinel_prefixes.clone(),
        })
    }

    /// Boundary configuration with its path resolved.
    ///
    /// `path` replaces the manifest's file while keeping its property.
    #[must_use]
    pub fn boundary_spec(&self, path: Option<&Utf8Path>) -> Option<BoundarySpec> {
        match (path, &self.boundaries) {
            (Some(path), Some(spec)) => Some(BoundarySpec {
                path: path.to_path_buf(),
                property: spec.property.clone(),
            }),
            (Some(path), None) => Some(BoundarySpec::new(path)),
            (None, Some(spec)) => Some(BoundarySpec {
                path: self.resolve(&spec.path),
                property: spec.property.clone(),
            }),
            (None, None) => None,
        }
    }

    /// Parse every source's headers and check its column mapping.
    ///
    /// # Errors
    /// Fails on the first unreadable file or mapping naming a missing
    /// column.
    pub fn check(&self) -> Result<Vec<SourceCheck>, ManifestError> {
        self.sources()
            .map(|(role, source)| -> Result<SourceCheck, ManifestError> {
                let files: Vec<Utf8PathBuf> =
                    source.files.iter().map(|file| self.resolve(file)).collect();
                let mut columns = BTreeSet::new();
                for file in &files {
                    let headers = read_headers(file, source.format)
                        .map_err(|err| source.source_error(err))?;
                    source
                        .fields
                        .validate_columns(&headers)
                        .map_err(|err| source.mapping_error(file, err))?;
                    columns.extend(headers);
                }
                Ok(SourceCheck {
                    role,
                    name: source.name.clone(),
                    files,
                    columns: columns.len(),
                })
            })
            .collect()
    }

    /// Read every source file.
    ///
    /// # Errors
    /// Fails on the first unreadable file or mapping naming a missing
    /// column.
    pub fn load_sources(&self) -> Result<LoadedSources, ManifestError> {
        let load_group = |sources: &[SourceSpec]| {
            sources
                .iter()
                .map(|source| self.load_source(source))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(LoadedSources {
            current: load_group(&self.current)?,
            reference: load_group(&self.reference)?,
            baseline: load_group(&self.baseline)?,
        })
    }

    fn load_source(&self, source: &SourceSpec) -> Result<SourceBatch, ManifestError> {
        let mut table = RawTable::default();
        for file in &source.files {
            let path = self.resolve(file);
            let part = read_table(&path, source.format).map_err(|err| source.source_error(err))?;
            source
                .fields
                .validate_columns(&part.headers)
                .map_err(|err| source.mapping_error(&path, err))?;
            table.append(part);
        }
        info!("{}: read {} rows from {} files", source.name, table.len(), source.files.len());
        Ok(SourceBatch {
            name: source.name.clone(),
            state: source.state.clone(),
            table,
            mapping: source.fields.clone(),
            filters: source.filters.clone(),
            rules: source.cleaning.clone(),
        })
    }
}
