//! Error taxonomy for the collection layer.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::collector::procfs::parser::ParseError;

/// Errors produced by a single collector.
///
/// None of these reach the HTTP layer: the aggregator turns every one of them
/// into a default fragment.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The virtual file is missing or unreadable.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but its content has an unexpected shape.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The collector did not finish within its deadline.
    #[error("collector {collector} did not finish within {timeout:?}")]
    Timeout {
        collector: &'static str,
        timeout: Duration,
    },

    /// The collector thread panicked before producing a result.
    #[error("collector {collector} aborted")]
    Aborted { collector: &'static str },
}

impl CollectError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CollectError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CollectError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_names_path() {
        let err = CollectError::io(
            "/proc/meminfo",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/proc/meminfo"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err = CollectError::from(ParseError::new("missing MemTotal"));
        assert_eq!(err.to_string(), "parse error: missing MemTotal");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_timeout_display() {
        let err = CollectError::Timeout {
            collector: "disks",
            timeout: Duration::from_millis(250),
        };
        assert_eq!(
            err.to_string(),
            "collector disks did not finish within 250ms"
        );
    }
}
