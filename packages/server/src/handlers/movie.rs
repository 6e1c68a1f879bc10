use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::multipart::AppMultipart;
use crate::extractors::query::AppQuery;
use crate::models::genre::GenreResponse;
use crate::models::movie::*;
use crate::services::catalog;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/movies",
    tag = "Movies",
    operation_id = "listMovies",
    summary = "List movies",
    description = "Returns movies newest first. With `cantidad=N` only the N most recently created movies are returned; omitting it (or passing 0) returns every movie.",
    params(MovieListQuery),
    responses(
        (status = 200, description = "Movie list", body = Vec<MovieResponse>),
        (status = 400, description = "Malformed `cantidad` (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_movies(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MovieListQuery>,
) -> Result<Json<Vec<MovieResponse>>, AppError> {
    let limit = query.limit()?;
    let movies = catalog::list_movies(&state.db, limit).await?;
    Ok(Json(movies.into_iter().map(MovieResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/movies",
    tag = "Movies",
    operation_id = "createMovie",
    summary = "Create a movie",
    description = "Creates a movie from a multipart form. `title`, `year`, `runtime`, `plot`, `director` and the four files are required: `poster` and `banner` must be jpg, bmp or png images; `file` and `trailer` must be mp4, mp3 or wav. Repeated `genre_id[]` fields link existing genres.",
    request_body(content_type = "multipart/form-data", description = "Movie fields and asset files"),
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 400, description = "Malformed multipart body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Upload too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Field validation failed (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn create_movie(
    State(state): State<AppState>,
    form: AppMultipart<MovieForm>,
) -> Result<impl IntoResponse, AppError> {
    let input = MovieInput::from_form(form.data).await?;
    let model = catalog::create_movie(&state, input).await?;
    Ok((StatusCode::CREATED, Json(MovieResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/v1/movies/{id}",
    tag = "Movies",
    operation_id = "getMovie",
    summary = "Get a movie with its genres",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie details", body = MovieDetailResponse),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(movie_id = id))]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetailResponse>, AppError> {
    let movie = catalog::find_movie(&state.db, id).await?;
    let genres = catalog::movie_genres(&state.db, id).await?;

    Ok(Json(MovieDetailResponse {
        movie: movie.into(),
        genres: genres.into_iter().map(GenreResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/movies/{id}/edit",
    tag = "Movies",
    operation_id = "editMovie",
    summary = "Get data for editing a movie",
    description = "Returns the movie together with every genre, for populating an edit form.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie and all genres", body = MovieEditResponse),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(movie_id = id))]
pub async fn edit_movie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MovieEditResponse>, AppError> {
    let movie = catalog::find_movie(&state.db, id).await?;
    let genres = catalog::list_genres(&state.db).await?;

    Ok(Json(MovieEditResponse {
        movie: movie.into(),
        genres: genres.into_iter().map(GenreResponse::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/movies/{id}",
    tag = "Movies",
    operation_id = "updateMovie",
    summary = "Update a movie",
    description = "Replaces the text fields of a movie. Asset files are optional; an omitted asset keeps its current stored path. Genre links are not changed. Also accepted as POST for HTML form clients.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body(content_type = "multipart/form-data", description = "Movie fields and optional asset files"),
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 400, description = "Malformed multipart body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Upload too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Field validation failed (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form), fields(movie_id = id))]
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: AppMultipart<MovieForm>,
) -> Result<Json<MovieResponse>, AppError> {
    let input = MovieInput::from_form(form.data).await?;
    let model = catalog::update_movie(&state, id, input).await?;
    Ok(Json(MovieResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/movies/{id}",
    tag = "Movies",
    operation_id = "deleteMovie",
    summary = "Delete a movie",
    description = "Removes the movie's genre links and then the movie. Asset files no other movie uses are deleted from storage.",
    params(("id" = i32, Path, description = "Movie ID")),
    responses(
        (status = 204, description = "Movie deleted"),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(movie_id = id))]
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    catalog::delete_movie(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/movies/{id}/genres",
    tag = "Movie Genres",
    operation_id = "addMovieGenres",
    summary = "Link genres to a movie",
    description = "Links each listed genre to the movie. Genres that are already linked are left unchanged.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body = GenreIdsRequest,
    responses(
        (status = 200, description = "Genres now linked to the movie", body = Vec<GenreResponse>),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Empty, duplicate or unknown genre ids (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(movie_id = id))]
pub async fn add_genres(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<GenreIdsRequest>,
) -> Result<Json<Vec<GenreResponse>>, AppError> {
    let genres = catalog::attach_genres(&state.db, id, &payload.genre_ids).await?;
    Ok(Json(genres.into_iter().map(GenreResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/movies/{id}/genres/remove",
    tag = "Movie Genres",
    operation_id = "removeMovieGenres",
    summary = "Unlink genres from a movie",
    description = "Removes the link between the movie and each listed genre. Genres that are not linked are ignored.",
    params(("id" = i32, Path, description = "Movie ID")),
    request_body = GenreIdsRequest,
    responses(
        (status = 200, description = "Genres still linked to the movie", body = Vec<GenreResponse>),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Movie not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Empty or duplicate genre ids (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(movie_id = id))]
pub async fn remove_genres(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<GenreIdsRequest>,
) -> Result<Json<Vec<GenreResponse>>, AppError> {
    let genres = catalog::detach_genres(&state.db, id, &payload.genre_ids).await?;
    Ok(Json(genres.into_iter().map(GenreResponse::from).collect()))
}
