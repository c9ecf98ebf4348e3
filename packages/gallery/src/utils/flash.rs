//! One-shot status messages carried in the redirect target's query string.

use axum::response::Redirect;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// `303 See Other` to `path` with a success message.
pub fn with_message(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?message={}", urlencoding::encode(message)))
}

/// `303 See Other` to `path` with an error message.
pub fn with_error(path: &str, error: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={}", urlencoding::encode(error)))
}
