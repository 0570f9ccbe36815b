//! Artifact records and their identifiers.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::DepotError;
use crate::hash::ContentHash;

/// Random bytes per artifact id (128 bits).
const ID_BYTES: usize = 16;

/// Opaque artifact identifier: 128 bits from the OS CSPRNG, hex encoded.
///
/// Doubles as the on-disk filename, so parsing is strict: exactly 32
/// lowercase hex characters and nothing else. Deserialization applies the
/// same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Generate a fresh, unguessable id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Get the first 2 characters (used for directory sharding).
    pub fn prefix(&self) -> &str {
        &self.0[0..2]
    }

    /// Get the remainder after the prefix (used as filename).
    pub fn remainder(&self) -> &str {
        &self.0[2..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = DepotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let well_formed = s.len() == ID_BYTES * 2
            && s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        if well_formed {
            Ok(Self(s))
        } else {
            Err(DepotError::InvalidId(s))
        }
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

/// A stored binary artifact.
///
/// `content_hash` is always the digest of the bytes at the artifact's storage
/// location; both are produced by the same write. The storage location is
/// internal and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: ArtifactId,
    pub name: String,
    pub description: String,
    /// Byte length, equal to both the declared size and the bytes written.
    pub file_size: u64,
    pub content_hash: ContentHash,
    pub upload_time: DateTime<Utc>,
    pub uploader_id: String,
    #[serde(skip)]
    pub(crate) storage_location: PathBuf,
}

impl Artifact {
    pub(crate) fn storage_location(&self) -> &Path {
        &self.storage_location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_id_format() {
        let id = ArtifactId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(format!("{}{}", id.prefix(), id.remainder()), id.as_str());
    }

    #[test]
    fn test_generated_ids_do_not_repeat() {
        let ids: HashSet<_> = (0..1000).map(|_| ArtifactId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_parse_accepts_generated_ids() {
        let id = ArtifactId::generate();
        let parsed: ArtifactId = id.as_str().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_prefixes_and_paths() {
        let id = ArtifactId::generate();
        for bad in [
            &id.as_str()[..8],
            "../../etc/passwd",
            "ABCDEF0123456789ABCDEF0123456789",
            "",
        ] {
            assert!(
                matches!(bad.parse::<ArtifactId>(), Err(DepotError::InvalidId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_deserialize_validates_id() {
        let id = ArtifactId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<ArtifactId>(&json).unwrap(), id);

        for bad in ["\"ab\"", "\"\"", "\"../../etc/passwd\""] {
            assert!(serde_json::from_str::<ArtifactId>(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_storage_location_is_not_serialized() {
        let artifact = Artifact {
            id: ArtifactId::generate(),
            name: "report.bin".to_string(),
            description: String::new(),
            file_size: 3,
            content_hash: ContentHash::from_data(b"abc"),
            upload_time: Utc::now(),
            uploader_id: "user-1".to_string(),
            storage_location: PathBuf::from("/srv/lockbox/objects/ab/cdef"),
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["fileSize"], 3);
        assert_eq!(json["contentHash"], artifact.content_hash.as_str());
        assert_eq!(json["uploaderId"], "user-1");
        assert!(json.get("storageLocation").is_none());
        assert!(!json.to_string().contains("/srv/lockbox"));
    }
}
