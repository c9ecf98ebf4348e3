/// Errors from reading or writing stored media files.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("media file not found: {0}")]
    NotFound(String),
    /// The stored name is not a flat filename this store could have generated.
    #[error("invalid stored name: {0}")]
    InvalidName(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}
