use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{BoxReader, MediaStore, NewMediaFile};
use crate::filename::{safe_extension, validate_flat_filename};
use crate::media::MediaKind;

/// Filesystem-backed media store.
///
/// Files live in one directory per kind:
/// `{base_path}/photos/{uuid}.{ext}` and `{base_path}/videos/{uuid}.{ext}`.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store, creating the kind directories.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        for kind in MediaKind::ALL {
            fs::create_dir_all(base_path.join(kind.plural())).await?;
        }
        Ok(Self { base_path })
    }

    /// Directory holding every file of `kind`.
    pub fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        self.base_path.join(kind.plural())
    }

    /// Generate a collision-resistant stored name.
    ///
    /// The extension comes from the original filename when it looks sane,
    /// otherwise from the declared MIME type.
    fn generate_name(original_name: &str, content_type: &str) -> String {
        let ext = safe_extension(original_name).or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|ext| ext.to_string())
        });
        let id = Uuid::new_v4().simple();
        match ext {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn create(
        &self,
        kind: MediaKind,
        original_name: &str,
        content_type: &str,
    ) -> Result<NewMediaFile, StorageError> {
        let stored_name = Self::generate_name(original_name, content_type);
        let path = self.locate(kind, &stored_name)?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        Ok(NewMediaFile {
            stored_name,
            path,
            file,
        })
    }

    fn locate(&self, kind: MediaKind, stored_name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_flat_filename(stored_name)
            .map_err(|e| StorageError::InvalidName(e.message().to_string()))?;
        Ok(self.kind_dir(kind).join(name))
    }

    async fn open(&self, kind: MediaKind, stored_name: &str) -> Result<BoxReader, StorageError> {
        let path = self.locate(kind, stored_name)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, kind: MediaKind, stored_name: &str) -> Result<bool, StorageError> {
        let path = self.locate(kind, stored_name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, kind: MediaKind, stored_name: &str) -> Result<bool, StorageError> {
        let path = self.locate(kind, stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
