use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::config::LimitsConfig;
use crate::handlers::{admin, auth, health, pages, upload};
use crate::state::AppState;

pub fn routes(limits: &LimitsConfig) -> Router<AppState> {
    guest_routes(limits).merge(admin_routes())
}

fn guest_routes(limits: &LimitsConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/qr.svg", get(pages::qr_code))
        .route("/health", get(health::health))
        .route(
            "/upload/photos",
            post(upload::upload_photos).layer(DefaultBodyLimit::max(upload::upload_body_limit(
                &limits.photos,
            ))),
        )
        .route(
            "/upload/videos",
            post(upload::upload_videos).layer(DefaultBodyLimit::max(upload::upload_body_limit(
                &limits.videos,
            ))),
        )
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(auth::login_page).post(auth::login))
        .route("/admin/logout", post(auth::logout))
        .route("/admin/{kind}/download", get(admin::download_all))
        .route("/admin/{kind}/delete-all", post(admin::delete_all))
        .route("/admin/{kind}/{id}", get(admin::view_media))
        .route("/admin/{kind}/{id}/delete", post(admin::delete_media))
}
