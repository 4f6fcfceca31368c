//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the collectors to work with both the real
//! `/proc` and `/sys` trees on Linux and mock implementations for testing.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::api::snapshot::Snapshot;
use crate::collector::CollectReport;

/// Abstraction for filesystem operations.
///
/// This trait allows collectors to read from the real filesystem or from
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// Returns full paths of the direct children, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual kernel virtual files.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?.map(|entry| entry.map(|e| e.path()));
        Ok(readable_entries(path, entries))
    }
}

/// Keeps the entries that could be read. Failed entries are skipped with a
/// debug log.
fn readable_entries(
    dir: &Path,
    entries: impl Iterator<Item = io::Result<PathBuf>>,
) -> Vec<PathBuf> {
    entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .collect()
}

/// Anything that can produce a complete, best-effort snapshot on demand.
///
/// The web layer holds one of these behind an `Arc` and calls it once per
/// request. Implementations must not fail: missing metrics become default
/// fragments.
pub trait SnapshotSource: Send + Sync {
    /// Collects a snapshot together with the timings and failures behind it.
    fn collect_reported(&self) -> (Snapshot, CollectReport);

    fn collect_snapshot(&self) -> Snapshot {
        self.collect_reported().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meminfo");
        fs::write(&path, "MemTotal: 16384 kB\n").unwrap();

        let content = RealFs::new().read_to_string(&path).unwrap();
        assert_eq!(content, "MemTotal: 16384 kB\n");
    }

    #[test]
    fn test_real_fs_exists() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        assert!(fs.exists(dir.path()));
        assert!(!fs.exists(&dir.path().join("nonexistent")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("1")).unwrap();
        fs::create_dir(dir.path().join("self")).unwrap();
        fs::write(dir.path().join("uptime"), "1.0 2.0\n").unwrap();

        let mut entries = RealFs::new().read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                dir.path().join("1"),
                dir.path().join("self"),
                dir.path().join("uptime"),
            ]
        );
    }

    #[test]
    fn test_readable_entries_skips_failed_entries() {
        let entries = vec![
            Ok(PathBuf::from("/proc/1")),
            Err(io::Error::new(io::ErrorKind::NotFound, "entry vanished")),
            Ok(PathBuf::from("/proc/self")),
            Err(io::Error::other("bad entry")),
            Ok(PathBuf::from("/proc/1000")),
        ];
        let paths = readable_entries(Path::new("/proc"), entries.into_iter());
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/proc/1"),
                PathBuf::from("/proc/self"),
                PathBuf::from("/proc/1000"),
            ]
        );
    }

    #[test]
    fn test_real_fs_read_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = RealFs::new()
            .read_dir(&dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
