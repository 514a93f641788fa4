//! Disk record types and key hashing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Suffix appended to the key hash to name the metadata artifact.
pub const METADATA_SUFFIX: &str = ".metadata";

/// Contents of the `<hash>.metadata` artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Absolute expiration instant, RFC 3339 on disk
    pub expires_at: DateTime<Utc>,
}

impl RecordMetadata {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A live record read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub payload: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

/// Maps a cache key to its filesystem-safe identifier: lowercase hex SHA-256.
///
/// Collisions are not handled.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_hash_key_is_stable_hex() {
        let hash = hash_key("forecast-33.88--84.51-2025-03-10");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, hash_key("forecast-33.88--84.51-2025-03-10"));
    }

    #[test]
    fn test_hash_key_known_value() {
        assert_eq!(
            hash_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_key_distinguishes_keys() {
        assert_ne!(hash_key("hourly-1-2-metric"), hash_key("hourly-1-2-imperial"));
    }

    #[test]
    fn test_hash_key_handles_unsafe_characters() {
        let hash = hash_key("../../etc/passwd?units=si&lat=1/2");
        assert!(!hash.contains('/'));
        assert!(!hash.contains('.'));
    }

    #[test]
    fn test_metadata_json_shape() {
        let metadata = RecordMetadata {
            expires_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 5, 0).unwrap(),
        };
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"expiresAt":"2025-03-10T12:05:00Z"}"#);

        let parsed: RecordMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_metadata_expiry_is_strict() {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 12, 5, 0).unwrap();
        let metadata = RecordMetadata { expires_at: at };
        assert!(!metadata.is_expired_at(at));
        assert!(metadata.is_expired_at(at + chrono::Duration::seconds(1)));
    }
}
