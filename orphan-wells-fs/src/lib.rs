//! Capability-based file access for registry inputs and artefacts.
//!
//! Every path is UTF-8 ([`camino`]) and every handle comes from a
//! [`cap_std`] directory opened with ambient authority, so callers never
//! touch `std::fs` directly.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Open `path` for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create or truncate `path` for writing, creating missing parent
/// directories first.
pub fn create_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_dir_and_name(path)?;
    dir.create(name.as_str())
}

/// Resolve `path` against `base` unless it is already absolute.
///
/// Manifests name their input files relative to the manifest's own
/// directory.
#[must_use]
pub fn resolve_against(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Directory containing `path` and the final path component.
pub fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Create every missing directory above `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    ensure_dir(parent)
}

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Utf8Path) -> io::Result<()> {
    let (base, relative) = split_root(dir)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// What, if anything, lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Nothing, or a parent directory is missing.
    Missing,
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// A socket, device or similar.
    Other,
}

/// Inspect `path` without following it into its contents.
pub fn entry_kind(path: &Utf8Path) -> io::Result<EntryKind> {
    let (dir, name) = match parent_dir_and_name(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(EntryKind::Missing),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) if meta.is_file() => Ok(EntryKind::File),
        Ok(meta) if meta.is_dir() => Ok(EntryKind::Directory),
        Ok(_) => Ok(EntryKind::Other),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(EntryKind::Missing),
        Err(err) => Err(err),
    }
}

/// Whether `path` exists and is a regular file.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    entry_kind(path).map(|kind| kind == EntryKind::File)
}

// cap-std only accepts relative paths below an opened directory, so an
// absolute path is split into its root and the remainder.
fn split_root(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let (base, relative) = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = path
                .strip_prefix(&base)
                .or_else(|_| path.strip_prefix(prefix))
                .map_err(|_| io::Error::other(format!("cannot strip {prefix} from {path}")))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = path
                .strip_prefix(&base)
                .map_err(|_| io::Error::other(format!("cannot strip the root from {path}")))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), path.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::{Read, Write};
    use tempfile::TempDir;

    #[fixture]
    fn scratch() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        (dir, root)
    }

    #[rstest]
    fn creates_nested_files(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        let target = root.join("out/run-1/summary.json");
        let mut file = create_utf8_file(&target).expect("create file");
        file.write_all(b"{}").expect("write");
        drop(file);

        assert!(is_regular_file(&target).expect("metadata"));
        let mut text = String::new();
        open_utf8_file(&target)
            .expect("open")
            .read_to_string(&mut text)
            .expect("read");
        assert_eq!(text, "{}");
    }

    #[rstest]
    fn missing_paths_are_not_files(scratch: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = scratch;
        assert!(!is_regular_file(&root.join("absent/wells.csv")).expect("metadata"));
        assert!(!is_regular_file(&root).expect("metadata"));
        assert_eq!(
            entry_kind(&root.join("absent/wells.csv")).expect("metadata"),
            EntryKind::Missing
        );
        assert_eq!(entry_kind(&root).expect("metadata"), EntryKind::Directory);
    }

    #[rstest]
    #[case("wells.csv", "/data/manifests/wells.csv")]
    #[case("../shared/wells.csv", "/data/manifests/../shared/wells.csv")]
    #[case("/srv/wells.csv", "/srv/wells.csv")]
    fn resolves_relative_paths(#[case] path: &str, #[case] expected: &str) {
        let resolved = resolve_against(Utf8Path::new("/data/manifests"), Utf8Path::new(path));
        assert_eq!(resolved, Utf8PathBuf::from(expected));
    }
}
