//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Only `StorageUnavailable` ever leaves [`crate::CacheManager`]'s constructors;
/// the other variants are logged and turned into misses at the tier boundary.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Base directory could not be created or is not writable
    #[error("Storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Read, write or delete failure on a single artifact
    #[error("I/O error during {operation} on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// Metadata artifact could not be parsed
    #[error("Corrupt cache record at {}: {source}", path.display())]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, operation: &'static str, source: io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            operation,
            source,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_names_operation_and_path() {
        let err = CacheError::io(
            "/tmp/cache/abc",
            "write payload",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("write payload"));
        assert!(msg.contains("/tmp/cache/abc"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_corrupt_record_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CacheError::CorruptRecord {
            path: PathBuf::from("abc.metadata"),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("Corrupt cache record"));
    }
}
