use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use super::area::StorageArea;
use super::error::StorageError;
use super::hash::ContentHash;
use super::path::StoredPath;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Layout: `{base_path}/{area}/{sha256}.{ext}`. Writes go to
/// `{base_path}/.tmp` first and are renamed into place, so a reader never
/// observes a partially written blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        for area in StorageArea::ALL {
            fs::create_dir_all(base_path.join(area.as_str())).await?;
        }
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, path: &StoredPath) -> PathBuf {
        self.base_path.join(path.relative_path())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Move a fully written temp file to its final location.
    async fn commit(
        &self,
        temp_path: &Path,
        area: StorageArea,
        hash: ContentHash,
        extension: &str,
    ) -> Result<StoredPath, StorageError> {
        let stored = match StoredPath::new(area, hash, extension) {
            Ok(stored) => stored,
            Err(e) => {
                let _ = fs::remove_file(temp_path).await;
                return Err(e);
            }
        };

        let blob_path = self.blob_path(&stored);
        if fs::try_exists(&blob_path).await? {
            let _ = fs::remove_file(temp_path).await;
            debug!(path = %stored, "blob already present");
            return Ok(stored);
        }

        if let Err(e) = fs::rename(temp_path, &blob_path).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }

        Ok(stored)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(
        &self,
        area: StorageArea,
        extension: &str,
        data: &[u8],
    ) -> Result<StoredPath, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let hash = ContentHash::compute(data);
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        self.commit(&temp_path, area, hash, extension).await
    }

    async fn put_stream(
        &self,
        area: StorageArea,
        extension: &str,
        mut reader: BoxReader,
    ) -> Result<StoredPath, StorageError> {
        let temp_path = self.temp_path();
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            hasher.update(&buf[..n]);
            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        self.commit(&temp_path, area, ContentHash::from_digest(hasher), extension)
            .await
    }

    async fn get_stream(&self, path: &StoredPath) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.blob_path(path)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &StoredPath) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(path)).await?)
    }

    async fn delete(&self, path: &StoredPath) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &StoredPath) -> Result<u64, StorageError> {
        match fs::metadata(self.blob_path(path)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
