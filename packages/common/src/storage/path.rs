use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::area::StorageArea;
use super::error::StorageError;
use super::hash::ContentHash;

const MAX_EXTENSION_LEN: usize = 8;

/// Identifier of a stored blob: `{area}/{hash}.{ext}`.
///
/// This is the value persisted on catalog records and the path assets are
/// served under. Parsing only accepts the canonical form, so a `StoredPath`
/// can always be joined onto a storage root without escaping it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StoredPath {
    area: StorageArea,
    hash: ContentHash,
    extension: String,
}

impl StoredPath {
    pub fn new(
        area: StorageArea,
        hash: ContentHash,
        extension: &str,
    ) -> Result<Self, StorageError> {
        validate_extension(extension)?;
        Ok(Self {
            area,
            hash,
            extension: extension.to_string(),
        })
    }

    pub fn area(&self) -> StorageArea {
        self.area
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name within the area directory.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.hash, self.extension)
    }

    /// Relative filesystem path (`images/<hash>.png`).
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.area.as_str()).join(self.file_name())
    }
}

fn validate_extension(ext: &str) -> Result<(), StorageError> {
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return Err(StorageError::InvalidPath(format!(
            "extension must be 1-{MAX_EXTENSION_LEN} characters"
        )));
    }
    if !ext
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err(StorageError::InvalidPath(format!(
            "extension '{ext}' must be lowercase alphanumeric"
        )));
    }
    Ok(())
}

impl FromStr for StoredPath {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (area, file) = s
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidPath(format!("missing area in '{s}'")))?;
        let (hash, ext) = file
            .split_once('.')
            .ok_or_else(|| StorageError::InvalidPath(format!("missing extension in '{s}'")))?;

        Self::new(area.parse()?, hash.parse()?, ext)
    }
}

impl fmt::Display for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.area, self.hash, self.extension)
    }
}

impl fmt::Debug for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoredPath({self})")
    }
}

impl Serialize for StoredPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StoredPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
