//! Error types emitted by the orphan-wells CLI.
//!
//! Library errors are boxed where they would otherwise make every
//! `Result<_, CliError>` large.

use std::sync::Arc;

use camino::Utf8PathBuf;
use orphan_wells_data::{BoundaryError, ExportError, ManifestError, RunError};
use thiserror::Error;

/// Errors emitted by the orphan-wells CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory { path: Utf8PathBuf },
    /// The manifest or one of its sources could not be used.
    #[error(transparent)]
    Manifest(Box<ManifestError>),
    /// State boundaries could not be loaded.
    #[error(transparent)]
    Boundaries(Box<BoundaryError>),
    /// Writing an artefact failed.
    #[error(transparent)]
    Export(Box<ExportError>),
    /// Writing the run report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}

impl From<ManifestError> for CliError {
    fn from(err: ManifestError) -> Self {
        Self::Manifest(Box::new(err))
    }
}

impl From<BoundaryError> for CliError {
    fn from(err: BoundaryError) -> Self {
        Self::Boundaries(Box::new(err))
    }
}

impl From<ExportError> for CliError {
    fn from(err: ExportError) -> Self {
        Self::Export(Box::new(err))
    }
}

impl From<RunError> for CliError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Manifest(inner) => inner.into(),
            RunError::Boundaries(inner) => inner.into(),
        }
    }
}
