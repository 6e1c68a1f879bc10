use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::AppError;
use crate::models::genre::GenreResponse;
use crate::services::catalog;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/genres",
    tag = "Genres",
    operation_id = "listGenres",
    summary = "List all genres",
    description = "Returns every genre ordered by id, for populating the create form.",
    responses(
        (status = 200, description = "Genre list", body = Vec<GenreResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_genres(
    State(state): State<AppState>,
) -> Result<Json<Vec<GenreResponse>>, AppError> {
    let genres = catalog::list_genres(&state.db).await?;
    Ok(Json(genres.into_iter().map(GenreResponse::from).collect()))
}
