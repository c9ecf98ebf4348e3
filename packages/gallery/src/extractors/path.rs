use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use common::MediaKind;

use crate::error::AppError;
use crate::models::shared::{parse_id, parse_kind};

/// `{kind}` path segment. Unknown kinds are a 404.
pub struct KindPath(pub MediaKind);

/// `{kind}/{id}` path segments. A malformed id is a 400, distinct from a
/// missing record.
pub struct MediaPath {
    pub kind: MediaKind,
    pub id: i32,
}

async fn segments<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
) -> Result<HashMap<String, String>, AppError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(params)
}

fn kind_of(params: &HashMap<String, String>) -> Result<MediaKind, AppError> {
    let segment = params
        .get("kind")
        .ok_or_else(|| AppError::NotFound("Missing media kind".into()))?;
    parse_kind(segment)
}

impl<S> FromRequestParts<S> for KindPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = segments(parts, state).await?;
        Ok(KindPath(kind_of(&params)?))
    }
}

impl<S> FromRequestParts<S> for MediaPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = segments(parts, state).await?;
        let kind = kind_of(&params)?;
        let id = parse_id(kind, params.get("id").map(String::as_str).unwrap_or(""))?;
        Ok(MediaPath { kind, id })
    }
}
