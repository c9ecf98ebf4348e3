pub mod media;
pub mod uploader;
