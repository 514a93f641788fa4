//! Persistent Module
//!
//! Disk tier of the cache: one payload file and one JSON metadata file per key,
//! both named by a hash of the key.

mod record;
mod store;

pub use record::{hash_key, PersistedRecord, RecordMetadata, METADATA_SUFFIX};
pub use store::{ArtifactPaths, ClearReport, PersistentStore};
