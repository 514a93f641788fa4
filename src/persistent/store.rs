//! Persistent Store Module
//!
//! Filesystem-backed key -> (payload, expiry) storage that survives restarts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{CacheError, Result};
use crate::persistent::{hash_key, PersistedRecord, RecordMetadata, METADATA_SUFFIX};

/// On-disk locations of one key's two artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Raw payload, `<hash>`
    pub payload: PathBuf,
    /// JSON metadata, `<hash>.metadata`
    pub metadata: PathBuf,
}

/// Outcome of a best-effort [`PersistentStore::clear`].
#[derive(Debug, Default)]
pub struct ClearReport {
    /// Files and stray directories deleted; a record counts twice, once per
    /// artifact
    pub removed: usize,
    /// Entries that could not be deleted, with the reason
    pub failures: Vec<(PathBuf, io::Error)>,
}

impl ClearReport {
    /// Returns true if every entry was deleted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// == Persistent Store ==
/// Disk tier of the cache.
///
/// Operations are blocking; [`crate::CacheManager`] runs them on the blocking
/// thread pool. Cloning is cheap and clones share the same directory.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    /// Directory where artifacts are stored
    dir: PathBuf,
    /// Source of "now" for expiry checks
    clock: Arc<dyn Clock>,
}

impl PersistentStore {
    // == Constructor ==
    /// Opens (creating if needed) the store rooted at `dir`.
    ///
    /// Fails with `StorageUnavailable` if the directory cannot be created or
    /// a scratch file cannot be written into it.
    pub fn open(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = dir.into();
        let unavailable = |source| CacheError::StorageUnavailable {
            path: dir.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(unavailable)?;
        // Dropping the scratch file deletes it.
        NamedTempFile::new_in(&dir).map_err(unavailable)?;

        debug!(dir = %dir.display(), "Persistent store opened");
        Ok(Self { dir, clock })
    }

    /// Directory the store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the artifact paths for `key`, whether or not they exist.
    pub fn artifact_paths(&self, key: &str) -> ArtifactPaths {
        let hash = hash_key(key);
        ArtifactPaths {
            metadata: self.dir.join(format!("{}{}", hash, METADATA_SUFFIX)),
            payload: self.dir.join(hash),
        }
    }

    // == Put ==
    /// Writes the payload and metadata artifacts for `key`, replacing any
    /// existing record.
    ///
    /// Each artifact is written to a temporary file and renamed into place.
    /// The payload lands first so metadata never points at a partial payload.
    pub fn put(&self, key: &str, payload: &[u8], expires_at: DateTime<Utc>) -> Result<()> {
        let paths = self.artifact_paths(key);
        let metadata = serde_json::to_vec(&RecordMetadata { expires_at }).map_err(|e| {
            CacheError::io(
                &paths.metadata,
                "encode metadata",
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;

        self.write_atomic(&paths.payload, payload, "write payload")?;
        self.write_atomic(&paths.metadata, &metadata, "write metadata")?;
        Ok(())
    }

    // == Get ==
    /// Reads the live record for `key`.
    ///
    /// Returns `Ok(None)` when the record is absent, half-present (the orphan
    /// is deleted) or expired (both artifacts are deleted). Unparsable metadata
    /// deletes both artifacts and returns `CorruptRecord`.
    pub fn get(&self, key: &str) -> Result<Option<PersistedRecord>> {
        let paths = self.artifact_paths(key);

        let Some(raw_metadata) = read_if_present(&paths.metadata)? else {
            if remove_if_present(&paths.payload)? {
                debug!(key, "Removed payload without metadata");
            }
            return Ok(None);
        };

        let metadata: RecordMetadata = match serde_json::from_slice(&raw_metadata) {
            Ok(metadata) => metadata,
            Err(source) => {
                warn!(key, path = %paths.metadata.display(), "Corrupt metadata, removing record");
                self.remove_paths(&paths)?;
                return Err(CacheError::CorruptRecord {
                    path: paths.metadata,
                    source,
                });
            }
        };

        if metadata.is_expired_at(self.clock.now()) {
            debug!(key, expires_at = %metadata.expires_at, "Disk record expired");
            self.remove_paths(&paths)?;
            return Ok(None);
        }

        match read_if_present(&paths.payload)? {
            Some(payload) => Ok(Some(PersistedRecord {
                payload,
                expires_at: metadata.expires_at,
            })),
            None => {
                debug!(key, "Removed metadata without payload");
                remove_if_present(&paths.metadata)?;
                Ok(None)
            }
        }
    }

    // == Remove ==
    /// Deletes both artifacts for `key`. Absent artifacts are not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.remove_paths(&self.artifact_paths(key))
    }

    // == Clear ==
    /// Deletes every entry in the store directory.
    ///
    /// Individual failures are collected in the report and do not stop the
    /// remaining deletions. Only failing to list the directory is an error.
    pub fn clear(&self) -> Result<ClearReport> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ClearReport::default()),
            Err(e) => return Err(CacheError::io(&self.dir, "list directory", e)),
        };

        let mut report = ClearReport::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.failures.push((self.dir.clone(), e));
                    continue;
                }
            };

            let path = entry.path();
            let result = match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => fs::remove_dir_all(&path),
                Ok(_) => fs::remove_file(&path),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete cache artifact");
                    report.failures.push((path, e));
                }
            }
        }

        Ok(report)
    }

    // == Helpers ==
    fn write_atomic(&self, path: &Path, bytes: &[u8], operation: &'static str) -> Result<()> {
        let mut file =
            NamedTempFile::new_in(&self.dir).map_err(|e| CacheError::io(&self.dir, operation, e))?;
        file.write_all(bytes)
            .map_err(|e| CacheError::io(path, operation, e))?;
        file.persist(path)
            .map_err(|e| CacheError::io(path, operation, e.error))?;
        Ok(())
    }

    /// Removes both artifacts, attempting the second even if the first fails.
    fn remove_paths(&self, paths: &ArtifactPaths) -> Result<()> {
        let payload = remove_if_present(&paths.payload);
        let metadata = remove_if_present(&paths.metadata);
        payload?;
        metadata?;
        Ok(())
    }
}

/// Reads a whole file, mapping `NotFound` to `None`.
fn read_if_present(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(path, "read artifact", e)),
    }
}

/// Deletes a file, returning whether it existed.
fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, "remove artifact", e)),
    }
}
