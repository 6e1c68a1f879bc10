//! Blob storage for catalog assets.
//!
//! Blobs are content-addressed within a [`StorageArea`]: the same bytes stored
//! twice in one area resolve to the same [`StoredPath`].

mod area;
mod error;
mod hash;
mod path;
mod traits;

pub mod filesystem;

pub use area::StorageArea;
pub use error::StorageError;
pub use hash::ContentHash;
pub use path::StoredPath;
pub use traits::{BlobStore, BoxReader};
