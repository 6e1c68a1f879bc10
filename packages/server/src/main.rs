use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use videoclub::config::AppConfig;
use videoclub::state::AppState;
use videoclub::views::HtmlShellRenderer;
use videoclub::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "videoclub=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    if config.catalog.seed_genres {
        seed::seed_genres(&db)
            .await
            .context("Failed to seed genres")?;
    }

    let blob_store = FilesystemBlobStore::new(
        config.storage.root.clone(),
        config.storage.max_blob_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to open blob store at {}",
            config.storage.root.display()
        )
    })?;
    info!(root = %blob_store.base_path().display(), "Blob store ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        views: Arc::new(HtmlShellRenderer::default()),
        config,
        asset_lock: Arc::default(),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
