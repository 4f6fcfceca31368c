//! Host telemetry collector for Linux.
//!
//! This module reads the kernel virtual files under `/proc` and `/sys` and
//! turns them into a [`Snapshot`](crate::api::Snapshot), with support for
//! mocking so tests run anywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Collector (aggregator)                   │
//! │  ┌──────────────────────┐   ┌─────────────────────────────┐  │
//! │  │  ProcessEnumerator   │   │     SystemCollector         │  │
//! │  │  - /proc/[pid]/comm  │   │  - cpuinfo, meminfo         │  │
//! │  └──────────┬───────────┘   │  - version, uptime, RTC     │  │
//! │             │               │  - partitions, net/dev      │  │
//! │             │               └──────────────┬──────────────┘  │
//! │             └──────────────┬───────────────┘                 │
//! │                     ┌──────▼──────┐                          │
//! │                     │  FileSystem │ (trait)                  │
//! │                     └──────┬──────┘                          │
//! └────────────────────────────┼─────────────────────────────────┘
//!                   ┌──────────┴──────────┐
//!            ┌──────▼──────┐       ┌──────▼──────┐
//!            │   RealFs    │       │   MockFs    │
//!            │  (Linux)    │       │  (Testing)  │
//!            └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use procstatus_core::collector::{Collector, HostPaths, MockFs, SnapshotSource};
//!
//! let collector = Collector::new(MockFs::typical_host(), HostPaths::default());
//! let snapshot = collector.collect_snapshot();
//! assert_eq!(snapshot.processes.len(), 3);
//! ```

#[allow(clippy::module_inception)]
mod collector;
mod error;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use collector::{CollectReport, Collector, CollectorFailure, CollectorTiming};
pub use error::CollectError;
pub use mock::MockFs;
pub use procfs::{HostPaths, ParseError};
pub use traits::{FileSystem, RealFs, SnapshotSource};
