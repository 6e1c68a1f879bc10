use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::area::StorageArea;
use super::error::StorageError;
use super::path::StoredPath;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Area-scoped, content-addressed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `area` and return where they landed.
    ///
    /// `extension` becomes part of the returned path and must be lowercase
    /// alphanumeric.
    async fn put(
        &self,
        area: StorageArea,
        extension: &str,
        data: &[u8],
    ) -> Result<StoredPath, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(area, extension, reader).await
    }

    /// Store data from an async reader.
    async fn put_stream(
        &self,
        area: StorageArea,
        extension: &str,
        reader: BoxReader,
    ) -> Result<StoredPath, StorageError>;

    /// Retrieve all bytes of a blob.
    async fn get(&self, path: &StoredPath) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn get_stream(&self, path: &StoredPath) -> Result<BoxReader, StorageError>;

    async fn exists(&self, path: &StoredPath) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, path: &StoredPath) -> Result<bool, StorageError>;

    /// Size of a blob in bytes.
    async fn size(&self, path: &StoredPath) -> Result<u64, StorageError>;
}
