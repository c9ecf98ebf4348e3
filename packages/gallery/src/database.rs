use std::time::Duration;

use sea_orm::sea_query::{Index, SqliteQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::media;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(8)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("gallery::entity::*")
        .sync(&db)
        .await?;

    ensure_indexes(&db).await?;

    Ok(db)
}

/// Ensure the composite index behind quota counts exists.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so it is created manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // SELECT COUNT(*) FROM media WHERE kind = ? AND uploader_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_media_kind_uploader")
        .table(media::Entity)
        .col(media::Column::Kind)
        .col(media::Column::UploaderId)
        .to_string(SqliteQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_media_kind_uploader exists"),
        Err(e) => tracing::warn!("Failed to create index idx_media_kind_uploader: {}", e),
    }

    Ok(())
}
