//! procstatus-core: host telemetry collection for the procstatus service.
//!
//! Provides:
//! - `collector`: `/proc` and `/sys` parsers, per-domain collectors and the
//!   snapshot aggregator
//! - `api`: JSON-serializable snapshot types
//! - `fmt`: shared formatting helpers (decimal megabytes, ISO-8601 timestamps)

pub mod api;
pub mod collector;
pub mod fmt;

/// Crate version, reported by the web binary at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
