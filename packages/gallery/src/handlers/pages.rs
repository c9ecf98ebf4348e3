use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{Html, IntoResponse, Response};
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::flash::Flash;
use crate::utils::http::public_base_url;
use crate::utils::qr::qr_svg;
use crate::views::{self, IndexView};

/// Guest landing page with both upload forms and the invite QR code.
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(flash): Query<Flash>,
) -> Html<String> {
    let public_url = public_base_url(&state.config.server, &headers);
    let svg = match qr_svg(&public_url) {
        Ok(svg) => Some(svg),
        Err(e) => {
            warn!(error = %e, "Could not render QR code");
            None
        }
    };
    // Drop the XML prolog so the markup can be inlined.
    let inline_svg = svg
        .as_deref()
        .and_then(|svg| svg.find("<svg").map(|start| &svg[start..]));

    Html(views::index_page(&IndexView {
        flash: &flash,
        limits: &state.config.limits,
        public_url: &public_url,
        qr_svg: inline_svg,
    }))
}

/// The invite QR code as a standalone image.
pub async fn qr_code(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let public_url = public_base_url(&state.config.server, &headers);
    let svg = qr_svg(&public_url).map_err(|e| AppError::Internal(format!("QR code: {e}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        svg,
    )
        .into_response())
}
