use axum::Json;
use axum::extract::State;
use common::MediaKind;

use crate::error::AppError;
use crate::models::media::HealthResponse;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Liveness plus a consistency check between records and files on disk.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let catalog = CatalogService::new(&state.db, state.store.as_ref());
    Ok(Json(HealthResponse {
        status: "ok",
        photos: catalog.health(MediaKind::Photo).await?,
        videos: catalog.health(MediaKind::Video).await?,
    }))
}
