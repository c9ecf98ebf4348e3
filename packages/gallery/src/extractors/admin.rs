use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use axum_extra::extract::cookie::CookieJar;

use crate::state::AppState;
use crate::utils::jwt::{self, SESSION_COOKIE};

pub const LOGIN_PATH: &str = "/admin/login";

/// Logged-in administrator, read from the session cookie.
///
/// Add this as a handler parameter to gate a route; requests without a
/// valid session are redirected to the login page.
pub struct AdminSession {
    pub username: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .ok_or_else(|| Redirect::to(LOGIN_PATH))?;

        let claims = jwt::verify(&token, &state.config.auth.session_secret).map_err(|e| {
            tracing::debug!(error = %e, "Rejected admin session");
            Redirect::to(LOGIN_PATH)
        })?;

        if !claims.admin {
            return Err(Redirect::to(LOGIN_PATH));
        }

        Ok(AdminSession {
            username: claims.sub,
        })
    }
}
