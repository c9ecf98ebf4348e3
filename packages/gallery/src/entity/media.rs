use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for one stored photo or video.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `photo` or `video`, see [`common::MediaKind::as_str`].
    pub kind: String,

    pub uploader_id: i32,
    #[sea_orm(belongs_to, from = "uploader_id", to = "id")]
    pub uploader: HasOne<super::uploader::Entity>,

    /// Generated name of the file inside the kind's upload directory.
    #[sea_orm(unique)]
    pub stored_name: String,

    /// Filename supplied by the guest. Untrusted.
    pub original_name: String,

    /// Declared MIME type.
    pub mime_type: String,

    pub size_bytes: i64,

    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
