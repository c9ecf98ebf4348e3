use std::sync::Arc;

use common::storage::MediaStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::export::Compressor;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub store: Arc<dyn MediaStore>,
    pub compressor: Arc<dyn Compressor>,
}
