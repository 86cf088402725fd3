//! The asset descriptor produced by a completed pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::upload::TerminalRange;
use super::variant::VariantSize;

/// Lifecycle state of an asset record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// Freshly ingested, waiting for a moderator.
    #[default]
    PendingVerification,
    Published,
    Rejected,
}

/// The packaged archive of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub url: String,
    /// Best-effort: absent when the digest could not be computed after upload.
    pub checksum: Option<String>,
    pub size: u64,
}

/// Everything the record repository needs to persist one asset.
///
/// Every URL points at an object the store confirmed; a descriptor is never
/// built from a partially stored run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub code: Uuid,
    pub name: String,
    pub author: String,
    pub categories: BTreeSet<String>,
    pub source: String,
    /// Byte length of the original upload.
    pub size: u64,
    pub file_url: String,
    pub checksum: String,
    pub cover_url: String,
    pub crops: BTreeMap<VariantSize, String>,
    pub archive: ArchiveInfo,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalRange>,
    pub target_packages: BTreeSet<String>,
    pub status: AssetStatus,
}

impl AssetDescriptor {
    /// True when every URL is present and there is one crop per expected size.
    pub fn is_complete(&self, expected_crops: &[VariantSize]) -> bool {
        !self.file_url.is_empty()
            && !self.cover_url.is_empty()
            && !self.archive.url.is_empty()
            && self.crops.len() == expected_crops.len()
            && expected_crops
                .iter()
                .all(|size| self.crops.get(size).is_some_and(|url| !url.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::VARIANT_SIZES;

    fn descriptor() -> AssetDescriptor {
        AssetDescriptor {
            code: Uuid::new_v4(),
            name: "Sunset".to_string(),
            author: "Jane".to_string(),
            categories: BTreeSet::new(),
            source: "baibian".to_string(),
            size: 1024,
            file_url: "http://cdn/master.jpg".to_string(),
            checksum: "abc".to_string(),
            cover_url: "http://cdn/cover.jpg".to_string(),
            crops: VARIANT_SIZES
                .iter()
                .map(|s| (*s, format!("http://cdn/{}.jpg", s)))
                .collect(),
            archive: ArchiveInfo {
                url: "http://cdn/a.zip".to_string(),
                checksum: None,
                size: 10,
            },
            created_at: Utc::now(),
            terminal: None,
            target_packages: BTreeSet::new(),
            status: AssetStatus::default(),
        }
    }

    #[test]
    fn test_complete_descriptor() {
        let d = descriptor();
        assert!(d.is_complete(&VARIANT_SIZES));
        assert_eq!(d.status, AssetStatus::PendingVerification);
    }

    #[test]
    fn test_missing_crop_is_incomplete() {
        let mut d = descriptor();
        d.crops.remove(&VARIANT_SIZES[2]);
        assert!(!d.is_complete(&VARIANT_SIZES));
    }

    #[test]
    fn test_terminal_omitted_when_absent() {
        let json = serde_json::to_value(descriptor()).unwrap();
        assert!(json.get("terminal").is_none());
        assert_eq!(json["status"], "pending_verification");
        assert!(json["crops"].get("460x383").is_some());
    }
}
