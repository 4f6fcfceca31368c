//! Host-wide collectors: one method per snapshot fragment.
//!
//! Every method has the same shape, `fn(&self) -> Result<Fragment, CollectError>`,
//! including the ones whose metric is not implemented yet (USB devices). The
//! aggregator relies on that uniformity for its fallback policy.

use std::path::PathBuf;

use crate::api::snapshot::{CpuInfo, DiskEntry, MemoryInfo, NetworkAdapter, UsbDevice};
use crate::collector::error::CollectError;
use crate::collector::procfs::parser::{
    ColumnarFileParser, KeyValueFileParser, ParseError, RawRecord, ScalarFileReader, Whitespace,
    parse_leading_u64,
};
use crate::collector::traits::FileSystem;
use crate::fmt::{epoch_to_local, format_decimal_mb, format_iso, kb_to_mb};

/// Locations of the virtual files the collectors read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    /// Base of the proc filesystem, usually `/proc`.
    pub proc_path: PathBuf,
    /// Real-time clock seconds since epoch.
    pub rtc_path: PathBuf,
}

impl HostPaths {
    pub const DEFAULT_PROC_PATH: &'static str = "/proc";
    pub const DEFAULT_RTC_PATH: &'static str = "/sys/class/rtc/rtc0/since_epoch";

    pub fn new(proc_path: impl Into<PathBuf>, rtc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
            rtc_path: rtc_path.into(),
        }
    }

    fn proc(&self, name: &str) -> PathBuf {
        self.proc_path.join(name)
    }
}

impl Default for HostPaths {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROC_PATH, Self::DEFAULT_RTC_PATH)
    }
}

/// Collects host-wide fragments from `/proc` and `/sys`.
#[derive(Debug, Clone)]
pub struct SystemCollector<F: FileSystem> {
    fs: F,
    paths: HostPaths,
    ws: Whitespace,
}

impl<F: FileSystem> SystemCollector<F> {
    /// Creates a new system collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `paths` - Locations of the proc root and RTC file
    /// * `ws` - Whitespace set handed to every parser
    pub fn new(fs: F, paths: HostPaths, ws: Whitespace) -> Self {
        Self { fs, paths, ws }
    }

    pub fn paths(&self) -> &HostPaths {
        &self.paths
    }

    fn key_value(&self, name: &str) -> Result<RawRecord, CollectError> {
        KeyValueFileParser::new(self.ws).parse_file(&self.fs, &self.paths.proc(name))
    }

    fn scalar(&self) -> ScalarFileReader {
        ScalarFileReader::new(self.ws)
    }

    fn columnar(&self) -> ColumnarFileParser {
        ColumnarFileParser::new(self.ws)
    }

    /// Reads the RTC and renders it as a local ISO-8601 timestamp.
    pub fn collect_datetime(&self) -> Result<String, CollectError> {
        let epoch = self.scalar().read_f64(&self.fs, &self.paths.rtc_path)?;
        let dt = epoch_to_local(epoch).ok_or_else(|| {
            ParseError::new(format!("epoch {} out of range", epoch))
        })?;
        Ok(format_iso(&dt))
    }

    /// Seconds since boot, the first field of `/proc/uptime`, verbatim.
    pub fn collect_uptime(&self) -> Result<String, CollectError> {
        self.scalar()
            .read_first_token(&self.fs, &self.paths.proc("uptime"))
    }

    /// CPU model and clock from `/proc/cpuinfo`.
    ///
    /// Both fields are optional: ARM kernels, for instance, expose neither.
    pub fn collect_cpuinfo(&self) -> Result<CpuInfo, CollectError> {
        let record = self.key_value("cpuinfo")?;
        Ok(CpuInfo {
            model: record.get("model name").map(str::to_string),
            speed_mhz: record.get("cpu MHz").map(str::to_string),
            usage_percent: 0.0,
        })
    }

    /// Total and used memory from `/proc/meminfo`, in decimal megabytes.
    pub fn collect_meminfo(&self) -> Result<MemoryInfo, CollectError> {
        let record = self.key_value("meminfo")?;

        let field_kb = |key: &str| -> Result<u64, CollectError> {
            let value = record
                .get(key)
                .ok_or_else(|| ParseError::new(format!("missing {} in meminfo", key)))?;
            parse_leading_u64(value, self.ws)
                .map_err(|e| ParseError::new(format!("{}: {}", key, e.message)).into())
        };

        let total = field_kb("MemTotal")?;
        let free = field_kb("MemFree")?;
        let used = total.saturating_sub(free);

        Ok(MemoryInfo {
            total_mb: Some(format_decimal_mb(total)),
            used_mb: Some(format_decimal_mb(used)),
        })
    }

    /// Kernel version banner from `/proc/version`, trailing newline included.
    pub fn collect_os_version(&self) -> Result<String, CollectError> {
        self.scalar().read_raw(&self.fs, &self.paths.proc("version"))
    }

    /// Block devices from `/proc/partitions`.
    ///
    /// Data rows are `major minor #blocks name`; anything else is ignored.
    pub fn collect_disks(&self) -> Result<Vec<DiskEntry>, CollectError> {
        let parser = self.columnar().with_columns(4);
        let content = parser.read_file(&self.fs, &self.paths.proc("partitions"))?;

        Ok(parser
            .rows(&content)
            .filter_map(|row| {
                let size_kb: u64 = row.get(2)?.parse().ok()?;
                let device = row.get(3)?;
                Some(DiskEntry {
                    device: device.to_string(),
                    size_mb: kb_to_mb(size_kb),
                })
            })
            .collect())
    }

    /// Interface names from `/proc/net/dev`.
    ///
    /// The name is the first token of each row, trimmed, so the kernel's
    /// trailing colon is kept (`lo:`, `eth0:`).
    pub fn collect_network_adapters(&self) -> Result<Vec<NetworkAdapter>, CollectError> {
        let parser = self.columnar();
        let content = parser.read_file(&self.fs, &self.paths.proc("net/dev"))?;

        Ok(parser
            .rows(&content)
            .filter_map(|row| row.get(0))
            .map(|token| NetworkAdapter {
                interface: self.ws.trim(token).to_string(),
                ip_address: String::new(),
            })
            .collect())
    }

    /// USB devices. Enumeration is not implemented; always empty.
    pub fn collect_usb_devices(&self) -> Result<Vec<UsbDevice>, CollectError> {
        Ok(Vec::new())
    }

    /// Whether the configured proc root is visible at all.
    pub fn proc_root_exists(&self) -> bool {
        self.fs.exists(&self.paths.proc_path)
    }
}
