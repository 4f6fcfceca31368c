//! JSON-serializable API types.

pub mod snapshot;

pub use snapshot::{
    CpuInfo, DiskEntry, MemoryInfo, NetworkAdapter, ProcessEntry, Snapshot, UsbDevice,
};
