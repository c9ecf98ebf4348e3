use common::MediaKind;
use common::storage::MediaStore;
use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, info, instrument, warn};

use crate::entity::{media, uploader};
use crate::models::media::{KindHealth, MediaItem};

/// Read and delete access to stored media for the admin surface.
pub struct CatalogService<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn MediaStore,
}

impl<'a> CatalogService<'a> {
    pub fn new(db: &'a DatabaseConnection, store: &'a dyn MediaStore) -> Self {
        Self { db, store }
    }

    /// All media of `kind` with uploader names, newest first.
    pub async fn list(&self, kind: MediaKind) -> Result<Vec<MediaItem>, DbErr> {
        let rows = media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .order_by_desc(media::Column::UploadedAt)
            .order_by_desc(media::Column::Id)
            .find_also_related(uploader::Entity)
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(record, owner)| MediaItem::from_parts(record, owner))
            .collect())
    }

    pub async fn count(&self, kind: MediaKind) -> Result<u64, DbErr> {
        media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .count(self.db)
            .await
    }

    pub async fn get(&self, kind: MediaKind, id: i32) -> Result<Option<media::Model>, DbErr> {
        media::Entity::find_by_id(id)
            .filter(media::Column::Kind.eq(kind.as_str()))
            .one(self.db)
            .await
    }

    /// Delete one record and its file.
    ///
    /// Returns `false` when no such record exists. File removal is best
    /// effort; a failure is logged and the record stays deleted.
    #[instrument(skip(self))]
    pub async fn delete_one(&self, kind: MediaKind, id: i32) -> Result<bool, DbErr> {
        let Some(record) = self.get(kind, id).await? else {
            return Ok(false);
        };
        media::Entity::delete_by_id(record.id).exec(self.db).await?;

        self.remove_file(kind, &record.stored_name).await;
        self.collect_orphan_uploaders().await?;
        info!(id, "Deleted {}", kind.as_str());
        Ok(true)
    }

    /// Delete every file and record of `kind`. Returns the number of records
    /// removed.
    #[instrument(skip(self))]
    pub async fn delete_all(&self, kind: MediaKind) -> Result<u64, DbErr> {
        let records = media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .all(self.db)
            .await?;

        for record in &records {
            self.remove_file(kind, &record.stored_name).await;
        }

        let deleted = media::Entity::delete_many()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .exec(self.db)
            .await?
            .rows_affected;

        self.collect_orphan_uploaders().await?;
        info!(deleted, "Deleted all {}", kind.plural());
        Ok(deleted)
    }

    /// Remove uploaders that no longer own media of any kind.
    pub async fn collect_orphan_uploaders(&self) -> Result<u64, DbErr> {
        let removed = uploader::Entity::delete_many()
            .filter(
                uploader::Column::Id.not_in_subquery(
                    Query::select()
                        .column(media::Column::UploaderId)
                        .from(media::Entity)
                        .to_owned(),
                ),
            )
            .exec(self.db)
            .await?
            .rows_affected;

        if removed > 0 {
            debug!(removed, "Removed uploaders without media");
        }
        Ok(removed)
    }

    /// Record count and how many of those records have no file on disk.
    pub async fn health(&self, kind: MediaKind) -> Result<KindHealth, DbErr> {
        let records = media::Entity::find()
            .filter(media::Column::Kind.eq(kind.as_str()))
            .all(self.db)
            .await?;

        let mut missing_files = 0;
        for record in &records {
            match self.store.exists(kind, &record.stored_name).await {
                Ok(true) => {}
                Ok(false) => missing_files += 1,
                Err(e) => {
                    warn!(id = record.id, error = %e, "Could not check stored file");
                    missing_files += 1;
                }
            }
        }

        Ok(KindHealth {
            records: records.len() as u64,
            missing_files,
        })
    }

    async fn remove_file(&self, kind: MediaKind, stored_name: &str) {
        match self.store.delete(kind, stored_name).await {
            Ok(true) => {}
            Ok(false) => debug!(stored_name, "File already gone"),
            Err(e) => warn!(stored_name, error = %e, "Failed to delete stored file"),
        }
    }
}
