use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory blobs are written under (`{root}/{area}/...`).
    pub root: PathBuf,
    /// Largest single asset accepted, in bytes.
    pub max_blob_size: u64,
    /// Request body limit for movie create/update, in bytes.
    pub max_upload_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Delete blobs that no movie references after an update or delete.
    pub reclaim_orphaned_assets: bool,
    /// Insert the default genre set on startup.
    pub seed_genres: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://videoclub.db?mode=rwc")?
            .set_default("storage.root", "./storage")?
            .set_default("storage.max_blob_size", 512 * 1024 * 1024_i64)?
            .set_default("storage.max_upload_size", 1024 * 1024 * 1024_i64)?
            .set_default("catalog.reclaim_orphaned_assets", true)?
            .set_default("catalog.seed_genres", true)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., VIDEOCLUB__DATABASE__URL)
            .add_source(Environment::with_prefix("VIDEOCLUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
