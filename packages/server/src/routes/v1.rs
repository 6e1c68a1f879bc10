use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/movies", movie_routes(config))
        .route("/genres", get(handlers::genre::list_genres))
}

fn movie_routes(config: &AppConfig) -> Router<AppState> {
    let reads = Router::new()
        .route("/", get(handlers::movie::list_movies))
        .route(
            "/{id}",
            get(handlers::movie::get_movie).delete(handlers::movie::delete_movie),
        )
        .route("/{id}/edit", get(handlers::movie::edit_movie))
        .route("/{id}/genres", post(handlers::movie::add_genres))
        .route("/{id}/genres/remove", post(handlers::movie::remove_genres));

    let uploads = Router::new()
        .route("/", post(handlers::movie::create_movie))
        .route(
            "/{id}",
            post(handlers::movie::update_movie).put(handlers::movie::update_movie),
        )
        .layer(DefaultBodyLimit::max(config.storage.max_upload_size));

    reads.merge(uploads)
}
