use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because configuration selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// Replication hint passed with every store request.
///
/// The hint is advisory. The local and S3 backends write exactly one copy in
/// either mode and only record the mode in their logs; redundancy comes from
/// the bucket's own replication settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    #[default]
    Single,
    Replicated,
}

impl FromStr for StoreMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(StoreMode::Single),
            "replicated" => Ok(StoreMode::Replicated),
            _ => Err(anyhow::anyhow!("Invalid store mode: {}", s)),
        }
    }
}

impl Display for StoreMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoreMode::Single => write!(f, "single"),
            StoreMode::Replicated => write!(f, "replicated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "local".parse::<StorageBackend>().unwrap(),
            StorageBackend::Local
        );
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_store_mode_round_trips_through_display() {
        for mode in [StoreMode::Single, StoreMode::Replicated] {
            assert_eq!(mode.to_string().parse::<StoreMode>().unwrap(), mode);
        }
    }
}
