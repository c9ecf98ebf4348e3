//! Zip export of every stored file of one kind.
//!
//! Files are copied into a scratch directory under sequential names, the
//! directory is compressed into a single archive and the archive is streamed
//! back. Both directories are removed when their guards drop: the scratch
//! directory as soon as compression ends, the archive directory once the
//! response body is finished or abandoned.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use common::MediaKind;
use common::filename::sanitize_archive_name;
use common::storage::MediaStore;
use futures::StreamExt;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tempfile::TempDir;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::entity::media;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error("{0}")]
    Other(String),
}

/// Packs a directory tree into a single archive file.
pub trait Compressor: Send + Sync {
    fn compress_dir(&self, src: &Path, dest: &Path) -> Result<(), ArchiveError>;
}

/// Deflate-compressed zip archives via the `zip` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipCompressor;

impl Compressor for ZipCompressor {
    fn compress_dir(&self, src: &Path, dest: &Path) -> Result<(), ArchiveError> {
        let file = File::create(dest)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        add_dir(&mut writer, src, "", options)?;

        let mut inner = writer.finish()?;
        inner.flush()?;
        Ok(())
    }
}

fn add_dir<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<(), ArchiveError> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            writer.add_directory(format!("{name}/"), options)?;
            add_dir(writer, &path, &format!("{name}/"), options)?;
        } else {
            writer.start_file(
                name,
                options.large_file(metadata.len() >= u64::from(u32::MAX)),
            )?;
            io::copy(&mut File::open(&path)?, writer)?;
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No files to download.")]
    Empty,
    #[error("Files missing on disk.")]
    AllMissing,
    #[error("Could not create archive.")]
    Compression(#[source] ArchiveError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("scratch directory: {0}")]
    Scratch(#[source] io::Error),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Empty | ExportError::AllMissing => AppError::NotFound(err.to_string()),
            ExportError::Compression(_) => AppError::ExportFailed(err.to_string()),
            ExportError::Database(e) => AppError::from(e),
            ExportError::Scratch(e) => AppError::Internal(format!("Export scratch space: {e}")),
        }
    }
}

/// A finished archive on disk, removed when this value (or the body built
/// from it) is dropped.
#[derive(Debug)]
pub struct PreparedArchive {
    pub file_name: String,
    pub size: u64,
    /// Records whose file was missing from the store.
    pub skipped: usize,
    path: PathBuf,
    dir: TempDir,
}

impl PreparedArchive {
    /// Open the archive as a streaming body. The archive directory lives
    /// until the stream is dropped.
    pub async fn into_body(self) -> io::Result<Body> {
        let file = tokio::fs::File::open(&self.path).await?;
        let dir = self.dir;
        let stream = ReaderStream::new(file).map(move |chunk| {
            let _ = &dir;
            chunk
        });
        Ok(Body::from_stream(stream))
    }
}

/// `photos-2026-10-16.zip`
pub fn archive_file_name(kind: MediaKind) -> String {
    format!(
        "{}-{}.zip",
        kind.plural(),
        chrono::Local::now().format("%Y-%m-%d")
    )
}

/// `0001_beach.jpg`; the counter is at least four digits wide and grows with
/// the number of records.
pub fn entry_name(seq: usize, total: usize, original_name: &str) -> String {
    let width = total.to_string().len().max(4);
    format!("{seq:0width$}_{}", sanitize_archive_name(original_name))
}

pub struct ExportService<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn MediaStore,
    compressor: Arc<dyn Compressor>,
    scratch_root: &'a Path,
}

impl<'a> ExportService<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        store: &'a dyn MediaStore,
        compressor: Arc<dyn Compressor>,
        scratch_root: &'a Path,
    ) -> Self {
        Self {
            db,
            store,
            compressor,
            scratch_root,
        }
    }

    #[instrument(skip(self))]
    pub async fn prepare(&self, kind: MediaKind) -> Result<PreparedArchive, ExportError> {
        let records = media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .order_by_desc(media::Column::UploadedAt)
            .order_by_desc(media::Column::Id)
            .all(self.db)
            .await?;

        if records.is_empty() {
            return Err(ExportError::Empty);
        }

        tokio::fs::create_dir_all(self.scratch_root)
            .await
            .map_err(ExportError::Scratch)?;
        let staging = scratch_dir(self.scratch_root, "export-")?;

        let total = records.len();
        let mut copied = 0;
        for (index, record) in records.iter().enumerate() {
            let dest = staging
                .path()
                .join(entry_name(index + 1, total, &record.original_name));
            match self.store.copy_to(kind, &record.stored_name, &dest).await {
                Ok(true) => copied += 1,
                Ok(false) => debug!(id = record.id, "Skipping record without file"),
                Err(e) => warn!(id = record.id, error = %e, "Skipping unreadable file"),
            }
        }

        if copied == 0 {
            return Err(ExportError::AllMissing);
        }

        let archive_dir = scratch_dir(self.scratch_root, "archive-")?;
        let file_name = archive_file_name(kind);
        let path = archive_dir.path().join(&file_name);

        let compressor = Arc::clone(&self.compressor);
        let src = staging.path().to_path_buf();
        let dest = path.clone();
        let compressed = tokio::task::spawn_blocking(move || compressor.compress_dir(&src, &dest))
            .await
            .unwrap_or_else(|e| Err(ArchiveError::Other(format!("compression task failed: {e}"))));
        drop(staging);

        if let Err(e) = compressed {
            warn!(error = %e, "Archive compression failed");
            return Err(ExportError::Compression(e));
        }

        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ExportError::Compression(e.into()))?
            .len();

        info!(copied, skipped = total - copied, size, "Prepared {} archive", kind.as_str());

        Ok(PreparedArchive {
            file_name,
            size,
            skipped: total - copied,
            path,
            dir: archive_dir,
        })
    }
}

fn scratch_dir(root: &Path, prefix: &str) -> Result<TempDir, ExportError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(root)
        .map_err(ExportError::Scratch)
}

/// Remove scratch directories left behind by a previous process.
pub async fn clear_scratch_root(root: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(root).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tokio::fs::create_dir_all(root).await
}
