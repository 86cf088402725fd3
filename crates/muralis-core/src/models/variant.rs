use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Target resolution of a derived image.
///
/// Serialized as `"{width}x{height}"` so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantSize {
    pub width: u32,
    pub height: u32,
}

impl VariantSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Display for VariantSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for VariantSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| anyhow::anyhow!("Invalid variant size: {}", s))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid variant width: {}", s))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid variant height: {}", s))?;
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("Variant size must be non-zero: {}", s));
        }
        Ok(Self { width, height })
    }
}

impl Serialize for VariantSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VariantSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
