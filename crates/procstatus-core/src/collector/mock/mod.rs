//! Mock implementations for testing.
//!
//! Provides an in-memory filesystem and pre-built host scenarios.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{MOCK_EPOCH, MOCK_RTC_PATH};
