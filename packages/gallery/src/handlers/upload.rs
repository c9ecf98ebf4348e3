use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use common::MediaKind;
use common::storage::{MediaStore, NewMediaFile};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::config::KindLimits;
use crate::error::AppError;
use crate::services::ingest::{IngestService, StagedBatch, StagedFile};
use crate::state::AppState;
use crate::utils::flash;

/// Slack on top of the file payload for the form fields and multipart framing.
const BODY_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Request body ceiling for one upload request of a kind.
pub fn upload_body_limit(limits: &KindLimits) -> usize {
    let bytes = limits
        .max_file_bytes()
        .saturating_mul(limits.max_files_per_request.max(1))
        .saturating_add(BODY_OVERHEAD_BYTES);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

/// What went wrong while receiving the multipart body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFault {
    /// A file, or the request as a whole, exceeded its size limit.
    Oversized,
    /// More files than one request may carry.
    TooManyFiles,
    Other,
}

#[derive(Debug)]
pub struct UploadProtocolError {
    pub fault: UploadFault,
    pub detail: String,
}

impl UploadProtocolError {
    fn new(fault: UploadFault, detail: impl Into<String>) -> Self {
        Self {
            fault,
            detail: detail.into(),
        }
    }

    fn from_multipart(err: MultipartError) -> Self {
        let fault = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadFault::Oversized
        } else {
            UploadFault::Other
        };
        Self::new(fault, err.body_text())
    }

    /// Error for the user, worded for the kind being uploaded.
    pub fn into_app_error(self, kind: MediaKind, limits: &KindLimits) -> AppError {
        match self.fault {
            UploadFault::Oversized => AppError::UploadLimit(format!(
                "A {} is too large. The maximum size is {} MB per {}.",
                kind.as_str(),
                limits.max_file_size_mb,
                kind.as_str()
            )),
            UploadFault::TooManyFiles => AppError::UploadLimit(format!(
                "Too many {plural} at once. You can upload up to {} {plural} per request.",
                limits.max_files_per_request,
                plural = kind.plural()
            )),
            UploadFault::Other => AppError::Validation(format!(
                "Upload failed: the {} could not be received. Please try again.",
                kind.plural()
            )),
        }
    }
}

/// Everything read from one upload form submission.
pub struct ReceivedUpload {
    pub name: String,
    pub batch: StagedBatch,
}

/// Read the multipart body, writing accepted files straight to the store.
///
/// Files whose declared type does not match `kind` are skipped without
/// being written. On error every file written so far is removed when the
/// partial batch drops.
pub async fn receive_upload(
    kind: MediaKind,
    limits: &KindLimits,
    store: &dyn MediaStore,
    mut multipart: Multipart,
) -> Result<ReceivedUpload, UploadProtocolError> {
    let mut name = String::new();
    let mut batch = StagedBatch::new(kind);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(UploadProtocolError::from_multipart)?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => {
                name = field
                    .text()
                    .await
                    .map_err(UploadProtocolError::from_multipart)?;
            }
            Some("files") => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                if original_name.is_empty() {
                    // Browsers send an empty part when no file was chosen.
                    continue;
                }
                if !kind.accepts(&content_type) {
                    debug!(%content_type, "Skipping file of the wrong type");
                    continue;
                }
                if batch.len() >= limits.max_files() {
                    return Err(UploadProtocolError::new(
                        UploadFault::TooManyFiles,
                        format!("more than {} files", limits.max_files()),
                    ));
                }
                let staged = stream_field_to_store(
                    field,
                    store,
                    kind,
                    &original_name,
                    &content_type,
                    limits.max_file_bytes(),
                )
                .await?;
                batch.push(staged);
            }
            _ => {}
        }
    }

    Ok(ReceivedUpload { name, batch })
}

/// Stream one multipart field into a new stored file.
async fn stream_field_to_store(
    mut field: Field<'_>,
    store: &dyn MediaStore,
    kind: MediaKind,
    original_name: &str,
    content_type: &str,
    max_size: u64,
) -> Result<StagedFile, UploadProtocolError> {
    let NewMediaFile {
        stored_name,
        path,
        mut file,
    } = store
        .create(kind, original_name, content_type)
        .await
        .map_err(|e| UploadProtocolError::new(UploadFault::Other, e.to_string()))?;

    let result = async {
        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(UploadProtocolError::from_multipart)?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(UploadProtocolError::new(
                    UploadFault::Oversized,
                    format!("file exceeds {max_size} bytes"),
                ));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| UploadProtocolError::new(UploadFault::Other, e.to_string()))?;
        }

        file.flush()
            .await
            .map_err(|e| UploadProtocolError::new(UploadFault::Other, e.to_string()))?;

        Ok(total_size)
    }
    .await;
    drop(file);

    match result {
        Ok(size) => Ok(StagedFile {
            stored_name,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size: i64::try_from(size).unwrap_or(i64::MAX),
            path,
        }),
        Err(e) => {
            // Best effort.
            let _ = tokio::fs::remove_file(&path).await;
            Err(e)
        }
    }
}

/// Upload photos.
///
/// Accepts `multipart/form-data` with a `name` field and one or more `files`
/// parts. Answers with a redirect to `/` carrying a flash message.
#[instrument(skip(state, multipart))]
pub async fn upload_photos(State(state): State<AppState>, multipart: Multipart) -> Redirect {
    upload(state, MediaKind::Photo, multipart).await
}

/// Upload videos. Same contract as [`upload_photos`].
#[instrument(skip(state, multipart))]
pub async fn upload_videos(State(state): State<AppState>, multipart: Multipart) -> Redirect {
    upload(state, MediaKind::Video, multipart).await
}

async fn upload(state: AppState, kind: MediaKind, multipart: Multipart) -> Redirect {
    let limits = state.config.limits.for_kind(kind);

    let received = match receive_upload(kind, limits, state.store.as_ref(), multipart).await {
        Ok(received) => received,
        Err(e) => {
            warn!(fault = ?e.fault, detail = %e.detail, "Upload rejected while receiving");
            return flash::with_error("/", &e.into_app_error(kind, limits).into_message());
        }
    };

    match IngestService::new(&state.db, limits)
        .ingest(&received.name, received.batch)
        .await
    {
        Ok(outcome) => {
            info!(
                uploader_id = outcome.uploader_id,
                accepted = outcome.accepted,
                skipped = outcome.skipped,
                "Upload complete"
            );
            flash::with_message("/", &outcome.message())
        }
        Err(e) => {
            debug!(error = %e, "Upload not ingested");
            flash::with_error("/", &AppError::from(e).into_message())
        }
    }
}
