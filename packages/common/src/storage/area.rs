use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Top-level namespace a blob is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    /// Posters and banners.
    Images,
    /// Full-length media files.
    Media,
    Trailer,
}

impl StorageArea {
    pub const ALL: [StorageArea; 3] = [Self::Images, Self::Media, Self::Trailer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Media => "media",
            Self::Trailer => "trailer",
        }
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageArea {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|area| area.as_str() == s)
            .ok_or_else(|| StorageError::InvalidPath(format!("unknown storage area '{s}'")))
    }
}
