use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A guest identity keyed by normalized display name.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "uploader")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Name exactly as the guest typed it on first submission.
    pub display_name: String,

    /// Trimmed, lower-cased display name.
    #[sea_orm(unique)]
    pub normalized_name: String,

    #[sea_orm(has_many)]
    pub media: HasMany<super::media::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Key two submissions must share to be attributed to the same uploader.
pub fn normalize_name(display_name: &str) -> String {
    display_name.trim().to_lowercase()
}
