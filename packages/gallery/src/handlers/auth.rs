use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, warn};

use crate::error::AppError;
use crate::extractors::admin::LOGIN_PATH;
use crate::handlers::admin::DASHBOARD_PATH;
use crate::models::auth::LoginForm;
use crate::state::AppState;
use crate::utils::flash::{self, Flash};
use crate::utils::jwt::{self, SESSION_COOKIE, SESSION_TTL_HOURS};
use crate::views;

pub async fn login_page(Query(flash): Query<Flash>) -> Html<String> {
    Html(views::login_page(&flash))
}

/// Check the submitted credentials and set the session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Redirect> {
    let auth = &state.config.auth;
    let valid = constant_time_eq(form.username.as_bytes(), auth.admin_username.as_bytes())
        & constant_time_eq(form.password.as_bytes(), auth.admin_password.as_bytes());
    if !valid {
        warn!(username = %form.username, "Failed admin login");
        return Err(flash::with_error(
            LOGIN_PATH,
            &AppError::InvalidCredentials.into_message(),
        ));
    }

    let token = jwt::sign(&form.username, &auth.session_secret).map_err(|e| {
        flash::with_error(
            LOGIN_PATH,
            &AppError::Internal(format!("Failed to sign session: {e}")).into_message(),
        )
    })?;

    let secure = state
        .config
        .server
        .base_url
        .as_deref()
        .is_some_and(|url| url.starts_with("https://"));
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_TTL_HOURS));

    info!(username = %form.username, "Admin logged in");
    Ok((jar.add(cookie), Redirect::to(DASHBOARD_PATH)))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, flash::with_message(LOGIN_PATH, "You have been logged out."))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
