//! API snapshot types: the `/status` JSON payload.
//!
//! One `Snapshot` = one complete point-in-time view of the host. Field
//! declaration order is the serialized key order and is part of the contract.

use serde::Serialize;

/// Top-level snapshot returned by `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Local wall-clock time, ISO-8601 without offset.
    pub datetime: String,
    /// First field of `/proc/uptime`, verbatim.
    pub uptime_seconds: Option<String>,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    /// `/proc/version` verbatim, trailing newline included.
    pub os_version: Option<String>,
    pub processes: Vec<ProcessEntry>,
    pub disks: Vec<DiskEntry>,
    pub usb_devices: Vec<UsbDevice>,
    pub network_adapters: Vec<NetworkAdapter>,
}

impl Snapshot {
    /// Top-level keys, in serialization order.
    pub const KEYS: [&'static str; 9] = [
        "datetime",
        "uptime_seconds",
        "cpu",
        "memory",
        "os_version",
        "processes",
        "disks",
        "usb_devices",
        "network_adapters",
    ];

    /// Renders the snapshot as pretty-printed JSON (2-space indent).
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuInfo {
    pub model: Option<String>,
    pub speed_mhz: Option<String>,
    /// Always 0.0: usage sampling is not implemented.
    pub usage_percent: f64,
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self {
            model: None,
            speed_mhz: None,
            usage_percent: 0.0,
        }
    }
}

/// Memory totals as human-readable decimal megabytes (`"16384.0 mb"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryInfo {
    pub total_mb: Option<String>,
    pub used_mb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskEntry {
    pub device: String,
    pub size_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkAdapter {
    pub interface: String,
    /// Always empty: address resolution is not implemented.
    pub ip_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsbDevice {
    pub port: String,
    pub description: String,
}
