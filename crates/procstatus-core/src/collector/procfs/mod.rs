//! Collectors for the Linux `/proc` filesystem.
//!
//! This module provides parsers and collectors for reading host information
//! from the `/proc` and `/sys` virtual filesystems.

pub mod parser;
pub mod process;
pub mod system;

pub use parser::{ParseError, RawRecord, Whitespace, KERNEL_WHITESPACE};
pub use process::ProcessEnumerator;
pub use system::{HostPaths, SystemCollector};
