pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;
pub mod views;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Videoclub API",
        version = "1.0.0",
        description = "Movie catalog with genre tagging and poster, banner, media and trailer uploads"
    ),
    paths(
        handlers::movie::list_movies,
        handlers::movie::create_movie,
        handlers::movie::get_movie,
        handlers::movie::edit_movie,
        handlers::movie::update_movie,
        handlers::movie::delete_movie,
        handlers::movie::add_genres,
        handlers::movie::remove_genres,
        handlers::genre::list_genres,
        handlers::assets::serve_asset,
    ),
    tags(
        (name = "Movies", description = "Movie CRUD and asset uploads"),
        (name = "Movie Genres", description = "Linking genres to movies"),
        (name = "Genres", description = "Genre lookup"),
        (name = "Assets", description = "Stored poster, banner, media and trailer files"),
    ),
)]
pub struct ApiDoc;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let config = &state.config;
    let router = axum::Router::new()
        .nest("/api", routes::api_routes(config))
        .nest("/peliculas", routes::page_routes(config))
        .nest("/storage", routes::asset_routes())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(cors_layer(&config.server.cors));

    router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}
