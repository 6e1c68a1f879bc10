use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::views::ViewRenderer;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub views: Arc<dyn ViewRenderer>,
    pub config: AppConfig,
    /// Shared while a request stores assets and commits the movie row that
    /// references them; exclusive while unreferenced assets are deleted.
    pub asset_lock: Arc<RwLock<()>>,
}
