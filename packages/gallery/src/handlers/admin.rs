use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use common::MediaKind;
use common::storage::StorageError;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::admin::AdminSession;
use crate::extractors::path::{KindPath, MediaPath};
use crate::models::media::KindSection;
use crate::services::catalog::CatalogService;
use crate::services::export::ExportService;
use crate::state::AppState;
use crate::utils::flash::{self, Flash};
use crate::utils::http::{attachment_disposition, content_disposition_value};
use crate::views;

pub const DASHBOARD_PATH: &str = "/admin";

/// Number of records left out of an archive because their file was gone.
pub const SKIPPED_FILES_HEADER: HeaderName = HeaderName::from_static("x-skipped-files");

/// Admin dashboard: both kinds with counts, limits and every stored item.
#[instrument(skip_all, fields(admin = %session.username))]
pub async fn dashboard(
    session: AdminSession,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>, AppError> {
    let catalog = CatalogService::new(&state.db, state.store.as_ref());

    let mut sections = Vec::with_capacity(MediaKind::ALL.len());
    for kind in MediaKind::ALL {
        sections.push(KindSection {
            kind,
            count: catalog.count(kind).await?,
            limits: *state.config.limits.for_kind(kind),
            items: catalog.list(kind).await?,
        });
    }

    Ok(Html(views::admin_page(&session.username, &flash, &sections)))
}

/// Stream one stored file inline with its recorded MIME type.
#[instrument(skip(_session, state, path), fields(kind = %path.kind, id = path.id))]
pub async fn view_media(
    _session: AdminSession,
    State(state): State<AppState>,
    path: MediaPath,
) -> Result<Response, AppError> {
    let MediaPath { kind, id } = path;
    let record = CatalogService::new(&state.db, state.store.as_ref())
        .get(kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind.title())))?;

    let reader = match state.store.open(kind, &record.stored_name).await {
        Ok(reader) => reader,
        Err(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
            return Err(AppError::FileMissing(format!(
                "{} file is missing on the server",
                kind.title()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = HeaderValue::from_str(&record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&record.original_name),
        )
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CONTENT_SECURITY_POLICY, "sandbox")
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

/// Delete one item and its file.
///
/// A malformed id answers with a flash like every other form outcome; an
/// unknown kind stays a 404.
#[instrument(skip_all)]
pub async fn delete_media(
    _session: AdminSession,
    State(state): State<AppState>,
    path: Result<MediaPath, AppError>,
) -> Response {
    let MediaPath { kind, id } = match path {
        Ok(path) => path,
        Err(e @ AppError::InvalidId(_)) => {
            return flash::with_error(DASHBOARD_PATH, &e.into_message()).into_response();
        }
        Err(e) => return e.into_response(),
    };
    tracing::debug!(%kind, id, "Deleting media");

    let redirect = match CatalogService::new(&state.db, state.store.as_ref())
        .delete_one(kind, id)
        .await
    {
        Ok(true) => flash::with_message(DASHBOARD_PATH, &format!("{} deleted.", kind.title())),
        Ok(false) => flash::with_error(
            DASHBOARD_PATH,
            &AppError::NotFound(format!("{} not found", kind.title())).into_message(),
        ),
        Err(e) => flash::with_error(DASHBOARD_PATH, &AppError::from(e).into_message()),
    };
    redirect.into_response()
}

/// Delete every item of a kind.
#[instrument(skip(_session, state))]
pub async fn delete_all(
    _session: AdminSession,
    State(state): State<AppState>,
    KindPath(kind): KindPath,
) -> Redirect {
    match CatalogService::new(&state.db, state.store.as_ref())
        .delete_all(kind)
        .await
    {
        Ok(deleted) => flash::with_message(
            DASHBOARD_PATH,
            &format!(
                "Deleted {}.",
                kind.count_label(usize::try_from(deleted).unwrap_or(usize::MAX))
            ),
        ),
        Err(e) => flash::with_error(DASHBOARD_PATH, &AppError::from(e).into_message()),
    }
}

/// Download every file of a kind as `<kind>-YYYY-MM-DD.zip`.
#[instrument(skip(_session, state))]
pub async fn download_all(
    _session: AdminSession,
    State(state): State<AppState>,
    KindPath(kind): KindPath,
) -> Response {
    let scratch_root = state.config.storage.tmp_dir();
    let service = ExportService::new(
        &state.db,
        state.store.as_ref(),
        state.compressor.clone(),
        &scratch_root,
    );

    let archive = match service.prepare(kind).await {
        Ok(archive) => archive,
        Err(e) => {
            return flash::with_error(DASHBOARD_PATH, &AppError::from(e).into_message())
                .into_response();
        }
    };

    let file_name = archive.file_name.clone();
    let size = archive.size;
    let skipped = archive.skipped;
    let body = match archive.into_body().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Could not open finished archive");
            return flash::with_error(
                DASHBOARD_PATH,
                &AppError::ExportFailed("Could not create archive.".into()).into_message(),
            )
            .into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition(&file_name)),
            (header::CONTENT_LENGTH, size.to_string()),
            (SKIPPED_FILES_HEADER, skipped.to_string()),
        ],
        body,
    )
        .into_response()
}
