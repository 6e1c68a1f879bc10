mod pages;
mod v1;

use axum::Router;
use axum::routing::get;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// JSON API, mounted at `/api`.
pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/v1", v1::routes(config))
        // Listing under its historical path.
        .route("/peliculas", get(handlers::movie::list_movies))
}

pub fn page_routes(config: &AppConfig) -> Router<AppState> {
    pages::routes(config)
}

pub fn asset_routes() -> Router<AppState> {
    Router::new().route("/{area}/{file}", get(handlers::assets::serve_asset))
}
