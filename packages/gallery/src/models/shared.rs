use common::MediaKind;

use crate::error::AppError;

/// Parse the `{kind}` path segment. Only the plural forms are routable.
pub fn parse_kind(segment: &str) -> Result<MediaKind, AppError> {
    MediaKind::ALL
        .into_iter()
        .find(|kind| kind.plural() == segment)
        .ok_or_else(|| AppError::NotFound(format!("Unknown media kind: {segment}")))
}

/// Parse the `{id}` path segment: a positive decimal integer, nothing else.
pub fn parse_id(kind: MediaKind, segment: &str) -> Result<i32, AppError> {
    let invalid = || AppError::InvalidId(format!("Invalid {} id", kind.as_str()));
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match segment.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid()),
    }
}
