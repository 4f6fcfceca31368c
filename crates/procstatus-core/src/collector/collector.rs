//! Snapshot aggregator.
//!
//! The `Collector` runs every fragment collector once, in a fixed order, and
//! assembles the results into a `Snapshot`. A failing collector never aborts
//! the snapshot: its error is logged and recorded in the `CollectReport`, and
//! a default fragment takes its place.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::api::snapshot::Snapshot;
use crate::collector::error::CollectError;
use crate::collector::procfs::{
    HostPaths, KERNEL_WHITESPACE, ProcessEnumerator, SystemCollector, Whitespace,
};
use crate::collector::traits::{FileSystem, SnapshotSource};
use crate::fmt::now_iso;

/// Timing information for each collector.
///
/// Used for debugging slow virtual files.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total snapshot collection time.
    pub total: Duration,
    pub datetime: Duration,
    pub uptime: Duration,
    pub cpu: Duration,
    pub memory: Duration,
    pub os_version: Duration,
    pub processes: Duration,
    pub disks: Duration,
    pub usb_devices: Duration,
    pub network_adapters: Duration,
}

/// A collector that fell back to its default fragment.
#[derive(Debug)]
pub struct CollectorFailure {
    pub collector: &'static str,
    pub error: CollectError,
}

/// Side information produced alongside a snapshot.
#[derive(Debug, Default)]
pub struct CollectReport {
    pub timing: CollectorTiming,
    pub failures: Vec<CollectorFailure>,
}

impl CollectReport {
    /// Names of the collectors that fell back, in collection order.
    pub fn failed_collectors(&self) -> Vec<&'static str> {
        self.failures.iter().map(|f| f.collector).collect()
    }
}

type CollectFn<F, T> = fn(&Collector<F>) -> Result<T, CollectError>;

/// Helper threads that missed their deadline, keyed by collector name. The
/// flag flips to `true` once the helper finally returns.
type StalledHelpers = Arc<Mutex<HashMap<&'static str, Arc<AtomicBool>>>>;

/// Main collector that gathers every snapshot fragment.
///
/// Holds no per-request state: each call to [`Collector::collect_with_report`]
/// reads the virtual files afresh.
#[derive(Debug, Clone)]
pub struct Collector<F: FileSystem + Clone + 'static> {
    system: SystemCollector<F>,
    processes: ProcessEnumerator<F>,
    timeout: Option<Duration>,
    stalled: StalledHelpers,
}

impl<F: FileSystem + Clone + 'static> Collector<F> {
    /// Default per-collector deadline.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Creates a new collector using the kernel whitespace set.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `paths` - Locations of the proc root and RTC file
    pub fn new(fs: F, paths: HostPaths) -> Self {
        Self::with_whitespace(fs, paths, KERNEL_WHITESPACE)
    }

    pub fn with_whitespace(fs: F, paths: HostPaths, ws: Whitespace) -> Self {
        let processes = ProcessEnumerator::new(fs.clone(), paths.proc_path.clone(), ws);
        let system = SystemCollector::new(fs, paths, ws);

        if !system.proc_root_exists() {
            warn!(
                path = %system.paths().proc_path.display(),
                "proc root not found; most fragments will fall back to defaults"
            );
        }

        Self {
            system,
            processes,
            timeout: Some(Self::DEFAULT_TIMEOUT),
            stalled: StalledHelpers::default(),
        }
    }

    /// Sets the per-collector deadline. `None` runs collectors inline with
    /// no deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn paths(&self) -> &HostPaths {
        self.system.paths()
    }

    /// Collectors whose helper thread from an earlier run is still blocked.
    ///
    /// While a collector is listed here it fails immediately with
    /// [`CollectError::Timeout`] instead of starting another helper.
    pub fn stalled_collectors(&self) -> Vec<&'static str> {
        let mut stalled = self.stalled_helpers();
        stalled.retain(|_, done| !done.load(Ordering::Acquire));
        let mut names: Vec<&'static str> = stalled.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn stalled_helpers(&self) -> MutexGuard<'_, HashMap<&'static str, Arc<AtomicBool>>> {
        self.stalled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Collects a complete snapshot together with timings and failures.
    ///
    /// Order: datetime, uptime, cpu, memory, os_version, processes, disks,
    /// usb_devices, network_adapters.
    pub fn collect_with_report(&self) -> (Snapshot, CollectReport) {
        let total_start = Instant::now();
        let mut report = CollectReport::default();
        let timing = &mut report.timing;
        let failures = &mut report.failures;

        let datetime = self
            .fragment("datetime", &mut timing.datetime, failures, |c| {
                c.system.collect_datetime()
            })
            .unwrap_or_else(now_iso);

        let uptime_seconds = self.fragment("uptime", &mut timing.uptime, failures, |c| {
            c.system.collect_uptime()
        });

        let cpu = self
            .fragment("cpu", &mut timing.cpu, failures, |c| c.system.collect_cpuinfo())
            .unwrap_or_default();

        let memory = self
            .fragment("memory", &mut timing.memory, failures, |c| {
                c.system.collect_meminfo()
            })
            .unwrap_or_default();

        let os_version = self.fragment("os_version", &mut timing.os_version, failures, |c| {
            c.system.collect_os_version()
        });

        let processes = self
            .fragment("processes", &mut timing.processes, failures, |c| {
                c.processes.collect_all()
            })
            .unwrap_or_default();

        let disks = self
            .fragment("disks", &mut timing.disks, failures, |c| c.system.collect_disks())
            .unwrap_or_default();

        let usb_devices = self
            .fragment("usb_devices", &mut timing.usb_devices, failures, |c| {
                c.system.collect_usb_devices()
            })
            .unwrap_or_default();

        let network_adapters = self
            .fragment(
                "network_adapters",
                &mut timing.network_adapters,
                failures,
                |c| c.system.collect_network_adapters(),
            )
            .unwrap_or_default();

        timing.total = total_start.elapsed();

        let snapshot = Snapshot {
            datetime,
            uptime_seconds,
            cpu,
            memory,
            os_version,
            processes,
            disks,
            usb_devices,
            network_adapters,
        };

        (snapshot, report)
    }

    /// Runs one collector and applies the fallback policy.
    fn fragment<T: Send + 'static>(
        &self,
        name: &'static str,
        elapsed: &mut Duration,
        failures: &mut Vec<CollectorFailure>,
        collect: CollectFn<F, T>,
    ) -> Option<T> {
        let start = Instant::now();
        let result = self.run_bounded(name, collect);
        *elapsed = start.elapsed();

        match result {
            Ok(fragment) => Some(fragment),
            Err(error) => {
                warn!(
                    collector = name,
                    missing = error.is_not_found(),
                    error = %error,
                    "collector failed; using default fragment"
                );
                failures.push(CollectorFailure {
                    collector: name,
                    error,
                });
                None
            }
        }
    }

    /// Runs `collect` under the configured deadline.
    ///
    /// With a deadline the collector runs on a helper thread. When the
    /// deadline passes the helper is abandoned and remembered; until it
    /// returns, later runs of the same collector time out at once so a hung
    /// file never holds more than one thread.
    fn run_bounded<T: Send + 'static>(
        &self,
        name: &'static str,
        collect: CollectFn<F, T>,
    ) -> Result<T, CollectError> {
        let Some(timeout) = self.timeout else {
            return collect(self);
        };

        {
            let mut stalled = self.stalled_helpers();
            if let Some(done) = stalled.get(name) {
                if !done.load(Ordering::Acquire) {
                    debug!(collector = name, "previous helper still blocked; skipping");
                    return Err(CollectError::Timeout {
                        collector: name,
                        timeout,
                    });
                }
                stalled.remove(name);
            }
        }

        let (tx, rx) = mpsc::channel();
        let done = Arc::new(AtomicBool::new(false));
        let helper_done = Arc::clone(&done);
        let this = self.clone();
        let spawned = thread::Builder::new()
            .name(format!("collect-{}", name))
            .spawn(move || {
                let _ = tx.send(collect(&this));
                helper_done.store(true, Ordering::Release);
            });

        if let Err(e) = spawned {
            warn!(collector = name, error = %e, "failed to spawn collector thread; running inline");
            return collect(self);
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.stalled_helpers().insert(name, done);
                Err(CollectError::Timeout {
                    collector: name,
                    timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(CollectError::Aborted { collector: name }),
        }
    }
}

impl<F: FileSystem + Clone + 'static> SnapshotSource for Collector<F> {
    fn collect_reported(&self) -> (Snapshot, CollectReport) {
        let (snapshot, report) = self.collect_with_report();
        debug!(
            total_ms = report.timing.total.as_millis() as u64,
            failed = ?report.failed_collectors(),
            timing = ?report.timing,
            "snapshot collected"
        );
        (snapshot, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex, MutexGuard};

    fn collector(fs: MockFs) -> Collector<MockFs> {
        Collector::new(fs, HostPaths::default())
    }

    /// Filesystem wrapper that records reads and can stall on one path.
    #[derive(Clone)]
    struct InstrumentedFs {
        inner: MockFs,
        reads: Arc<Mutex<HashMap<PathBuf, usize>>>,
        stall: Option<(PathBuf, Duration)>,
    }

    impl InstrumentedFs {
        fn new(inner: MockFs) -> Self {
            Self {
                inner,
                reads: Arc::new(Mutex::new(HashMap::new())),
                stall: None,
            }
        }

        fn reads_of(&self, path: &str) -> usize {
            self.reads
                .lock()
                .unwrap()
                .get(Path::new(path))
                .copied()
                .unwrap_or(0)
        }
    }

    impl FileSystem for InstrumentedFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            *self
                .reads
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_insert(0) += 1;
            if let Some((stall_path, delay)) = &self.stall
                && stall_path == path
            {
                thread::sleep(*delay);
            }
            self.inner.read_to_string(path)
        }

        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
            self.inner.read_dir(path)
        }
    }

    #[test]
    fn test_typical_host_fully_populated() {
        let (snapshot, report) = collector(MockFs::typical_host()).collect_with_report();

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(snapshot.uptime_seconds.as_deref(), Some("12345.67"));
        assert!(snapshot.cpu.model.is_some());
        assert_eq!(snapshot.memory.total_mb.as_deref(), Some("16384.0 mb"));
        assert!(snapshot.os_version.as_deref().unwrap().ends_with('\n'));
        assert_eq!(snapshot.processes.len(), 3);
        assert_eq!(snapshot.disks.len(), 4);
        assert!(snapshot.usb_devices.is_empty());
        assert_eq!(snapshot.network_adapters.len(), 2);
    }

    #[test]
    fn test_missing_meminfo_isolated() {
        let (snapshot, report) = collector(MockFs::without_meminfo()).collect_with_report();

        assert_eq!(report.failed_collectors(), vec!["memory"]);
        assert_eq!(snapshot.memory.total_mb, None);
        assert_eq!(snapshot.memory.used_mb, None);

        // Everything else is still there.
        assert!(snapshot.uptime_seconds.is_some());
        assert!(snapshot.cpu.model.is_some());
        assert!(snapshot.os_version.is_some());
        assert_eq!(snapshot.processes.len(), 3);
        assert_eq!(snapshot.disks.len(), 4);
        assert_eq!(snapshot.network_adapters.len(), 2);

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_pretty_json().unwrap()).unwrap();
        assert!(json["memory"]["total_mb"].is_null());
        assert!(json["memory"]["used_mb"].is_null());
    }

    #[test]
    fn test_minimal_host() {
        let (snapshot, report) = collector(MockFs::minimal_host()).collect_with_report();

        assert_eq!(
            report.failed_collectors(),
            vec!["datetime", "disks", "network_adapters"]
        );
        // Wall clock fallback.
        assert!(!snapshot.datetime.is_empty());
        assert!(snapshot.processes.is_empty());
        assert_eq!(snapshot.memory.used_mb.as_deref(), Some("512.0 mb"));

        let json: serde_json::Value =
            serde_json::from_str(&snapshot.to_pretty_json().unwrap()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = Snapshot::KEYS.to_vec();
        let mut actual = keys.clone();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_empty_filesystem_still_yields_snapshot() {
        let (snapshot, report) = collector(MockFs::new()).collect_with_report();

        // usb_devices is the only collector that cannot fail.
        assert_eq!(report.failures.len(), 8);
        assert_eq!(snapshot.cpu.usage_percent, 0.0);
        assert!(snapshot.to_pretty_json().is_ok());
    }

    #[test]
    fn test_each_file_read_once() {
        let fs = InstrumentedFs::new(MockFs::typical_host());
        let c = Collector::new(fs.clone(), HostPaths::default()).with_timeout(None);
        c.collect_snapshot();

        for path in [
            "/proc/cpuinfo",
            "/proc/meminfo",
            "/proc/version",
            "/proc/uptime",
            "/proc/partitions",
            "/proc/net/dev",
            "/proc/1/comm",
            HostPaths::DEFAULT_RTC_PATH,
        ] {
            assert_eq!(fs.reads_of(path), 1, "{}", path);
        }
        assert_eq!(fs.reads_of("/proc/self/comm"), 0);
    }

    #[test]
    fn test_stalled_collector_times_out() {
        let mut fs = InstrumentedFs::new(MockFs::typical_host());
        fs.stall = Some((PathBuf::from("/proc/partitions"), Duration::from_millis(500)));
        let c = Collector::new(fs, HostPaths::default())
            .with_timeout(Some(Duration::from_millis(50)));

        let (snapshot, report) = c.collect_with_report();

        assert_eq!(report.failed_collectors(), vec!["disks"]);
        assert!(matches!(
            report.failures[0].error,
            CollectError::Timeout {
                collector: "disks",
                ..
            }
        ));
        assert!(snapshot.disks.is_empty());
        assert_eq!(snapshot.network_adapters.len(), 2);
    }

    #[test]
    fn test_stalled_helper_is_not_respawned() {
        let mut fs = InstrumentedFs::new(MockFs::typical_host());
        fs.stall = Some((PathBuf::from("/proc/partitions"), Duration::from_millis(400)));
        let c = Collector::new(fs.clone(), HostPaths::default())
            .with_timeout(Some(Duration::from_millis(50)));

        let (_, first) = c.collect_with_report();
        let (_, second) = c.collect_with_report();

        assert_eq!(first.failed_collectors(), vec!["disks"]);
        assert_eq!(second.failed_collectors(), vec!["disks"]);
        assert!(matches!(
            second.failures[0].error,
            CollectError::Timeout { collector: "disks", .. }
        ));
        // Only the first run reached the file; the second failed fast.
        assert_eq!(fs.reads_of("/proc/partitions"), 1);
        assert_eq!(c.stalled_collectors(), vec!["disks"]);

        thread::sleep(Duration::from_millis(600));
        assert!(c.stalled_collectors().is_empty());
    }

    #[test]
    fn test_inline_mode_matches_threaded_mode() {
        let threaded = collector(MockFs::typical_host()).collect_snapshot();
        let inline = collector(MockFs::typical_host())
            .with_timeout(None)
            .collect_snapshot();

        assert_eq!(threaded.processes, inline.processes);
        assert_eq!(threaded.disks, inline.disks);
        assert_eq!(threaded.memory, inline.memory);
        assert_eq!(threaded.datetime, inline.datetime);
    }

    #[test]
    fn test_timing_recorded() {
        let (_, report) = collector(MockFs::typical_host()).collect_with_report();
        assert!(report.timing.total >= report.timing.processes);
    }
}
