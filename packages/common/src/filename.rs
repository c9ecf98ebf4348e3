/// Result of validating a flat filename.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
///
/// Stored names are generated by the server, so anything failing this check
/// did not come from us and must never be joined onto an upload directory.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Longest sanitized name kept inside an archive, in characters.
const MAX_ARCHIVE_NAME_CHARS: usize = 120;

/// Turn an untrusted original filename into something safe to use as an
/// archive entry name.
///
/// Path-unsafe characters and control characters are dropped, runs of
/// whitespace collapse into a single `_`, and leading dots are removed.
/// Falls back to `"file"` when nothing usable is left.
pub fn sanitize_archive_name(original: &str) -> String {
    // Only the last path component counts; browsers on some platforms send
    // the full client path.
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let mut out = String::with_capacity(base.len());
    let mut pending_space = false;
    for c in base.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
            continue;
        }
        if pending_space {
            out.push('_');
            pending_space = false;
        }
        out.push(c);
    }

    let trimmed = out.trim_start_matches('.');
    let truncated: String = trimmed.chars().take(MAX_ARCHIVE_NAME_CHARS).collect();
    if truncated.is_empty() {
        "file".to_string()
    } else {
        truncated
    }
}

/// Lower-cased extension of an untrusted filename, if it looks sane
/// (1-10 ASCII alphanumerics).
pub fn safe_extension(original: &str) -> Option<String> {
    let (_, ext) = original.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
