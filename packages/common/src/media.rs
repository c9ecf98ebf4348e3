use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two kinds of media a guest can submit.
///
/// Both kinds share the same record shape but live in separate upload
/// directories and have independent quotas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Photo, MediaKind::Video];

    /// Value stored in the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    /// Plural form, used for URL segments and directory names.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Photo => "photos",
            Self::Video => "videos",
        }
    }

    /// Capitalized singular form for headings and messages.
    pub fn title(self) -> &'static str {
        match self {
            Self::Photo => "Photo",
            Self::Video => "Video",
        }
    }

    /// `"1 photo"`, `"3 photos"`.
    pub fn count_label(self, count: usize) -> String {
        if count == 1 {
            format!("1 {}", self.as_str())
        } else {
            format!("{count} {}", self.plural())
        }
    }

    /// Declared MIME type prefix a file must carry to be accepted as this kind.
    pub fn mime_prefix(self) -> &'static str {
        match self {
            Self::Photo => "image/",
            Self::Video => "video/",
        }
    }

    /// Boundary filter applied to every incoming file before it is written.
    pub fn accepts(self, content_type: &str) -> bool {
        content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with(self.mime_prefix())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown media kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media kind: {0}")]
pub struct UnknownMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    /// Accepts both the singular column value and the plural URL segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" | "photos" => Ok(Self::Photo),
            "video" | "videos" => Ok(Self::Video),
            other => Err(UnknownMediaKind(other.to_string())),
        }
    }
}
