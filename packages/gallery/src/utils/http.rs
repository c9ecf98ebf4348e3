use axum::http::{HeaderMap, header};

use crate::config::ServerConfig;

/// Build an inline `Content-Disposition` header value.
///
/// Quotes are stripped from the display name; the full name travels in the
/// RFC 5987 `filename*` parameter.
pub fn content_disposition_value(filename: &str) -> String {
    let filename: String = filename.chars().filter(|c| *c != '"').collect();
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// `Content-Disposition` for a file the browser should save.
pub fn attachment_disposition(filename: &str) -> String {
    content_disposition_value(filename).replacen("inline", "attachment", 1)
}

/// The URL guests should open, as encoded in the QR code.
///
/// A configured `server.base_url` wins; otherwise it is rebuilt from the
/// proxy headers or the `Host` header of the current request.
pub fn public_base_url(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &config.base_url {
        return url.clone();
    }

    let first_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    };

    let proto = first_value("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = first_value("x-forwarded-host")
        .or_else(|| first_value(header::HOST.as_str()))
        .unwrap_or_else(|| format!("localhost:{}", config.port));

    format!("{proto}://{host}")
}
