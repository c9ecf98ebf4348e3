//! Upload ingestion: validate, resolve the uploader, admit, persist.
//!
//! Files are written to disk by the multipart receiver before ingestion
//! starts. Every file that does not end up referenced by a committed media
//! row is removed again, whichever way the pipeline exits.

use std::path::PathBuf;

use chrono::Utc;
use common::quota::{self, Admission, QuotaRejection, QuotaSnapshot};
use common::MediaKind;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use crate::config::KindLimits;
use crate::entity::{media, uploader};
use crate::error::AppError;

/// A file already written to disk, waiting for its metadata row.
#[derive(Debug)]
pub struct StagedFile {
    pub stored_name: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub path: PathBuf,
}

/// Owns the files of one upload request until they are committed.
///
/// Files still owned when the batch is dropped are removed synchronously.
#[derive(Debug)]
pub struct StagedBatch {
    kind: MediaKind,
    files: Vec<StagedFile>,
}

impl StagedBatch {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn push(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    /// Split off everything from index `at` into a new batch.
    fn split_off(&mut self, at: usize) -> StagedBatch {
        let (kept, rest) = quota::partition(std::mem::take(&mut self.files), at);
        self.files = kept;
        StagedBatch {
            kind: self.kind,
            files: rest,
        }
    }

    /// Remove every owned file from disk.
    pub async fn discard(mut self) {
        for file in self.files.drain(..) {
            if let Err(e) = tokio::fs::remove_file(&file.path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %file.path.display(), error = %e, "Failed to remove staged file");
            }
        }
    }

    /// Release ownership: the files now belong to committed records.
    fn commit(mut self) -> usize {
        let count = self.files.len();
        self.files.clear();
        count
    }
}

impl Drop for StagedBatch {
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            let _ = std::fs::remove_file(&file.path);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Please enter your name.")]
    MissingName,
    #[error("Please choose at least one {} to upload.", .0.as_str())]
    EmptyBatch(MediaKind),
    #[error("{}", quota_message(*kind, *reason))]
    Quota {
        kind: MediaKind,
        reason: QuotaRejection,
    },
    #[error("Upload failed: {0}")]
    Persistence(String),
}

fn quota_message(kind: MediaKind, reason: QuotaRejection) -> String {
    match reason {
        QuotaRejection::GalleryFull => format!(
            "The {} gallery is full. No more {} can be uploaded.",
            kind.as_str(),
            kind.plural()
        ),
        QuotaRejection::PerPersonLimit { limit } => format!(
            "You've reached the maximum of {limit} {} per person.",
            kind.plural()
        ),
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MissingName | IngestError::EmptyBatch(_) => {
                AppError::Validation(err.to_string())
            }
            IngestError::Quota { .. } => AppError::QuotaExceeded(err.to_string()),
            IngestError::Persistence(_) => AppError::UploadFailed(err.to_string()),
        }
    }
}

/// Result of a successful (possibly partial) ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub kind: MediaKind,
    pub uploader_id: i32,
    pub accepted: usize,
    pub skipped: usize,
}

impl IngestOutcome {
    pub fn message(&self) -> String {
        let mut message = format!("Uploaded {}.", self.kind.count_label(self.accepted));
        if self.skipped > 0 {
            let verb = if self.skipped == 1 { "was" } else { "were" };
            message.push_str(&format!(
                " {} {verb} skipped due to upload limits.",
                self.kind.count_label(self.skipped)
            ));
        }
        message
    }
}

pub struct IngestService<'a> {
    db: &'a DatabaseConnection,
    limits: &'a KindLimits,
}

impl<'a> IngestService<'a> {
    pub fn new(db: &'a DatabaseConnection, limits: &'a KindLimits) -> Self {
        Self { db, limits }
    }

    /// Run a received batch through validation, admission and persistence.
    #[instrument(skip(self, batch), fields(kind = %batch.kind(), files = batch.len()))]
    pub async fn ingest(
        &self,
        display_name: &str,
        mut batch: StagedBatch,
    ) -> Result<IngestOutcome, IngestError> {
        let kind = batch.kind();
        if display_name.trim().is_empty() {
            batch.discard().await;
            return Err(IngestError::MissingName);
        }
        if batch.is_empty() {
            return Err(IngestError::EmptyBatch(kind));
        }

        let uploader = match resolve_uploader(self.db, display_name).await {
            Ok(uploader) => uploader,
            Err(e) => {
                batch.discard().await;
                return Err(persistence_error(e));
            }
        };

        let snapshot = match self.snapshot(kind, uploader.id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                batch.discard().await;
                return Err(persistence_error(e));
            }
        };

        let (accepted, skipped) = match quota::admit(snapshot, batch.len()) {
            Admission::Rejected(reason) => {
                debug!(?snapshot, ?reason, "Batch rejected by quota");
                batch.discard().await;
                return Err(IngestError::Quota { kind, reason });
            }
            Admission::Accepted { accepted, skipped } => (accepted, skipped),
        };

        batch.split_off(accepted).discard().await;

        if let Err(e) = persist(self.db, kind, uploader.id, &batch).await {
            batch.discard().await;
            return Err(persistence_error(e));
        }
        batch.commit();

        info!(
            uploader_id = uploader.id,
            accepted, skipped, "Stored uploaded {}", kind.plural()
        );

        Ok(IngestOutcome {
            kind,
            uploader_id: uploader.id,
            accepted,
            skipped,
        })
    }

    async fn snapshot(&self, kind: MediaKind, uploader_id: i32) -> Result<QuotaSnapshot, DbErr> {
        let uploader_count = media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .filter(media::Column::UploaderId.eq(uploader_id))
            .count(self.db)
            .await?;
        let global_count = media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .count(self.db)
            .await?;

        Ok(QuotaSnapshot {
            uploader_count,
            uploader_limit: self.limits.per_person,
            global_count,
            global_limit: self.limits.total,
        })
    }
}

fn persistence_error(err: DbErr) -> IngestError {
    warn!(error = %err, "Failed to persist upload");
    let reason = match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => "a stored file name collided",
        _ => "the database rejected the upload",
    };
    IngestError::Persistence(reason.to_string())
}

/// Find the uploader by normalized name, creating it on first upload.
///
/// A concurrent create of the same name loses on the unique index; the loser
/// re-reads the winner's row.
pub async fn resolve_uploader(
    db: &DatabaseConnection,
    display_name: &str,
) -> Result<uploader::Model, DbErr> {
    let normalized = uploader::normalize_name(display_name);

    if let Some(existing) = find_uploader(db, &normalized).await? {
        return Ok(existing);
    }

    let created = uploader::ActiveModel {
        display_name: Set(display_name.to_string()),
        normalized_name: Set(normalized.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await;

    match created {
        Ok(model) => Ok(model),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            find_uploader(db, &normalized)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound(format!("uploader {normalized}")))
        }
        Err(e) => Err(e),
    }
}

async fn find_uploader(
    db: &DatabaseConnection,
    normalized: &str,
) -> Result<Option<uploader::Model>, DbErr> {
    uploader::Entity::find()
        .filter(uploader::Column::NormalizedName.eq(normalized))
        .one(db)
        .await
}

/// Insert one media row per staged file in a single transaction.
async fn persist(
    db: &DatabaseConnection,
    kind: MediaKind,
    uploader_id: i32,
    batch: &StagedBatch,
) -> Result<(), DbErr> {
    let now = Utc::now();
    let txn = db.begin().await?;
    for file in batch.files() {
        media::ActiveModel {
            kind: Set(kind.as_str().to_string()),
            uploader_id: Set(uploader_id),
            stored_name: Set(file.stored_name.clone()),
            original_name: Set(file.original_name.clone()),
            mime_type: Set(file.content_type.clone()),
            size_bytes: Set(file.size),
            uploaded_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await
}
