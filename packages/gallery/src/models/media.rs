use chrono::{DateTime, Utc};
use common::MediaKind;
use serde::Serialize;

use crate::config::KindLimits;
use crate::entity::{media, uploader};

/// One row of the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub id: i32,
    pub uploader_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl MediaItem {
    pub fn from_parts(record: media::Model, owner: Option<uploader::Model>) -> Self {
        Self {
            id: record.id,
            uploader_name: owner
                .map(|u| u.display_name)
                .unwrap_or_else(|| "unknown".to_string()),
            original_name: record.original_name,
            mime_type: record.mime_type,
            size_bytes: record.size_bytes,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Everything the dashboard shows for one kind.
#[derive(Debug, Clone)]
pub struct KindSection {
    pub kind: MediaKind,
    pub count: u64,
    pub limits: KindLimits,
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct KindHealth {
    pub records: u64,
    pub missing_files: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub photos: KindHealth,
    pub videos: KindHealth,
}

/// Human-readable size, e.g. `2.4 MB`.
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
