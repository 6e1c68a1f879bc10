use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers::pages;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    let views = Router::new()
        .route("/", get(pages::index))
        .route("/create", get(pages::create))
        .route("/{id}", get(pages::show).delete(pages::destroy))
        .route("/{id}/edit", get(pages::edit))
        .route("/{id}/delete", post(pages::destroy))
        .route("/{id}/add-genre", post(pages::add_genre))
        .route("/{id}/delete-genre", post(pages::delete_genre));

    let uploads = Router::new()
        .route("/", post(pages::store))
        .route("/{id}", post(pages::update).put(pages::update))
        .layer(DefaultBodyLimit::max(config.storage.max_upload_size));

    views.merge(uploads)
}
