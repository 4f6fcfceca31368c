//! Process enumeration from `/proc/[pid]/comm`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::api::snapshot::ProcessEntry;
use crate::collector::error::CollectError;
use crate::collector::procfs::parser::Whitespace;
use crate::collector::traits::FileSystem;

/// Lists running processes and their command names.
#[derive(Debug, Clone)]
pub struct ProcessEnumerator<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
    ws: Whitespace,
}

impl<F: FileSystem> ProcessEnumerator<F> {
    /// Creates a new enumerator.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `ws` - Whitespace set stripped from command names
    pub fn new(fs: F, proc_path: impl Into<PathBuf>, ws: Whitespace) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            ws,
        }
    }

    /// Reads the command name of a single process.
    pub fn read_comm(&self, pid: u32) -> Result<String, CollectError> {
        let path = self.proc_path.join(pid.to_string()).join("comm");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::io(&path, e))?;
        Ok(self.ws.trim(&content).to_string())
    }

    /// Collects every process visible under the proc root, sorted by pid.
    ///
    /// Non-numeric entries (`self`, `net`, ...) are ignored. Processes that
    /// disappear between listing and reading are dropped.
    pub fn collect_all(&self) -> Result<Vec<ProcessEntry>, CollectError> {
        let entries = self
            .fs
            .read_dir(&self.proc_path)
            .map_err(|e| CollectError::io(&self.proc_path, e))?;

        let mut processes: Vec<ProcessEntry> = entries
            .iter()
            .filter_map(|entry| pid_from_entry(entry))
            .filter_map(|pid| match self.read_comm(pid) {
                Ok(name) => Some(ProcessEntry { pid, name }),
                Err(e) => {
                    debug!(pid, error = %e, "process disappeared during enumeration");
                    None
                }
            })
            .collect();

        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }
}

/// Returns the PID for a `/proc/<digits>` entry.
fn pid_from_entry(entry: &Path) -> Option<u32> {
    let name = entry.file_name()?.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u32>().ok().filter(|&pid| pid > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::procfs::parser::KERNEL_WHITESPACE;

    fn enumerator(fs: MockFs) -> ProcessEnumerator<MockFs> {
        ProcessEnumerator::new(fs, "/proc", KERNEL_WHITESPACE)
    }

    #[test]
    fn test_collect_all_processes() {
        let processes = enumerator(MockFs::typical_host()).collect_all().unwrap();

        let pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 1000, 1001]);
        assert_eq!(processes[0].name, "systemd");
        assert_eq!(processes[1].name, "bash");
    }

    #[test]
    fn test_non_numeric_entries_ignored() {
        // typical_host has /proc/self/comm, which must not show up.
        let processes = enumerator(MockFs::typical_host()).collect_all().unwrap();
        assert!(processes.iter().all(|p| p.name != "cat"));
    }

    #[test]
    fn test_vanished_process_dropped() {
        let processes = enumerator(MockFs::with_vanishing_process())
            .collect_all()
            .unwrap();
        assert_eq!(processes.len(), 3);
        assert!(processes.iter().all(|p| p.pid != 4242));
    }

    #[test]
    fn test_no_processes() {
        let processes = enumerator(MockFs::minimal_host()).collect_all().unwrap();
        assert!(processes.is_empty());
    }

    #[test]
    fn test_missing_proc_root() {
        let err = enumerator(MockFs::new()).collect_all().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_comm_whitespace_trimmed() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/77/comm", "Web Content\n");
        let e = enumerator(fs);
        assert_eq!(e.read_comm(77).unwrap(), "Web Content");
    }

    #[test]
    fn test_pid_from_entry() {
        assert_eq!(pid_from_entry(Path::new("/proc/1234")), Some(1234));
        assert_eq!(pid_from_entry(Path::new("/proc/self")), None);
        assert_eq!(pid_from_entry(Path::new("/proc/+12")), None);
        assert_eq!(pid_from_entry(Path::new("/proc/0")), None);
        assert_eq!(pid_from_entry(Path::new("/proc/99999999999")), None);
    }
}
