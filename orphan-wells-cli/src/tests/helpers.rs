//! Scratch workspaces holding a small manifest and its sources.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

pub(super) const MANIFEST: &str = r#"
[[current]]
name = "Ohio"
state = "Ohio"
files = ["ohio.csv"]
fields = { api_10 = "API", well_status = "STATUS", lat = "LAT", lon = "LON" }
statuses = { orphaned = ["AB"], plugged = ["PA"] }

[[baseline]]
name = "USGS"
files = ["baseline.csv"]
fields = { api_10 = "API", state = "STATE", lat = "LAT", lon = "LON" }
fixed_status = "ORPHANED"
"#;

const OHIO: &str = "API,STATUS,LAT,LON\n\
                    3400100001,AB,40.0,-82.0\n\
                    3400100002,AB,40.5,-82.0\n\
                    3400100003,PA,41.0,-82.0\n";

const BASELINE: &str = "API,STATE,LAT,LON\n\
                        3400100002,Ohio,40.5,-82.0\n";

/// Per-state report line expected for [`MANIFEST`].
pub(super) const OHIO_REPORT_LINE: &str = "Ohio\t3\t3\t3\t1\t0\t0\t2\t1\t0";

#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    /// A workspace with [`MANIFEST`] and its source files written.
    pub(super) fn with_manifest() -> Self {
        let workspace = Self::new();
        workspace.seed();
        workspace
    }

    /// Write [`MANIFEST`] and its source files.
    pub(super) fn seed(&self) {
        self.write("manifest.toml", MANIFEST);
        self.write("ohio.csv", OHIO);
        self.write("baseline.csv", BASELINE);
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn manifest(&self) -> Utf8PathBuf {
        self.root.join("manifest.toml")
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("out")
    }

    pub(super) fn write(&self, name: &str, contents: &str) {
        fs::write(self.root.join(name), contents).expect("write fixture");
    }
}
