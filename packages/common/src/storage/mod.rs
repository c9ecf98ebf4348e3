mod error;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemMediaStore;
pub use traits::{BoxReader, MediaStore, NewMediaFile};
