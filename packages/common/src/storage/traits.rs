use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use crate::media::MediaKind;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A freshly reserved media file, open for writing.
pub struct NewMediaFile {
    /// Generated name the database record will reference.
    pub stored_name: String,
    /// Absolute location of the file.
    pub path: PathBuf,
    pub file: tokio::fs::File,
}

/// Storage for raw media bytes, addressed by `(kind, stored name)`.
///
/// Stored names are generated by the store and never derived from the
/// uploader's filename.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Reserve a new, unique stored name and open it for writing.
    async fn create(
        &self,
        kind: MediaKind,
        original_name: &str,
        content_type: &str,
    ) -> Result<NewMediaFile, StorageError>;

    /// Resolve a stored name to its on-disk path without touching the disk.
    fn locate(&self, kind: MediaKind, stored_name: &str) -> Result<PathBuf, StorageError>;

    /// Open a stored file for streaming.
    async fn open(&self, kind: MediaKind, stored_name: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a stored file is present on disk.
    async fn exists(&self, kind: MediaKind, stored_name: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, kind: MediaKind, stored_name: &str) -> Result<bool, StorageError>;

    /// Copy a stored file to `dest`.
    ///
    /// Returns `false` if the stored file is missing.
    async fn copy_to(
        &self,
        kind: MediaKind,
        stored_name: &str,
        dest: &Path,
    ) -> Result<bool, StorageError> {
        let src = self.locate(kind, stored_name)?;
        match tokio::fs::copy(&src, dest).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
