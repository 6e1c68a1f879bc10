//! Server-rendered pages under `/peliculas`.
//!
//! Reads render a named view; writes answer `303 See Other` to the listing.
//! A submission that fails field validation re-renders its form with status
//! 422, the error map and the submitted text.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use crate::error::{AppError, FieldErrors};
use crate::extractors::form::AppForm;
use crate::extractors::multipart::AppMultipart;
use crate::extractors::query::AppQuery;
use crate::models::genre::{GenreResponse, GenreSelection};
use crate::models::movie::{MovieForm, MovieInput, MovieListQuery, MovieResponse, OldInput};
use crate::services::catalog;
use crate::state::AppState;
use crate::views::{View, render_page};

const LISTING: &str = "/peliculas";

fn page(
    state: &AppState,
    status: StatusCode,
    name: &'static str,
    context: impl Serialize,
) -> Result<Response, AppError> {
    let view = View::new(name, context)?;
    Ok(render_page(&*state.views, status, &view)?)
}

fn to_listing() -> Response {
    Redirect::to(LISTING).into_response()
}

async fn all_genres(state: &AppState) -> Result<Vec<GenreResponse>, AppError> {
    let genres = catalog::list_genres(&state.db).await?;
    Ok(genres.into_iter().map(GenreResponse::from).collect())
}

#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MovieListQuery>,
) -> Result<Response, AppError> {
    let movies: Vec<MovieResponse> = catalog::list_movies(&state.db, query.limit()?)
        .await?
        .into_iter()
        .map(MovieResponse::from)
        .collect();

    page(&state, StatusCode::OK, "movies.index", json!({ "movies": movies }))
}

#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<Response, AppError> {
    create_form(&state, StatusCode::OK, FieldErrors::new(), OldInput::default()).await
}

async fn create_form(
    state: &AppState,
    status: StatusCode,
    errors: FieldErrors,
    old: OldInput,
) -> Result<Response, AppError> {
    let genres = all_genres(state).await?;
    page(
        state,
        status,
        "movies.create",
        json!({ "genres": genres, "errors": errors, "old": old }),
    )
}

#[instrument(skip(state, form))]
pub async fn store(
    State(state): State<AppState>,
    form: AppMultipart<MovieForm>,
) -> Result<Response, AppError> {
    let input = MovieInput::from_form(form.data).await?;
    let old = input.old_input();

    match catalog::create_movie(&state, input).await {
        Ok(_) => Ok(to_listing()),
        Err(AppError::InvalidFields(errors)) => {
            create_form(&state, StatusCode::UNPROCESSABLE_ENTITY, errors, old).await
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state), fields(movie_id = id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    show_page(&state, id, StatusCode::OK, FieldErrors::new()).await
}

async fn show_page(
    state: &AppState,
    id: i32,
    status: StatusCode,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let movie = MovieResponse::from(catalog::find_movie(&state.db, id).await?);
    let genres: Vec<GenreResponse> = catalog::movie_genres(&state.db, id)
        .await?
        .into_iter()
        .map(GenreResponse::from)
        .collect();

    let context = if errors.is_empty() {
        json!({ "movie": movie, "genres": genres })
    } else {
        json!({ "movie": movie, "genres": genres, "errors": errors })
    };
    page(state, status, "movies.show", context)
}

#[instrument(skip(state), fields(movie_id = id))]
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let movie = catalog::find_movie(&state.db, id).await?;
    edit_form(
        &state,
        movie.into(),
        StatusCode::OK,
        FieldErrors::new(),
        OldInput::default(),
    )
    .await
}

async fn edit_form(
    state: &AppState,
    movie: MovieResponse,
    status: StatusCode,
    errors: FieldErrors,
    old: OldInput,
) -> Result<Response, AppError> {
    let genres = all_genres(state).await?;
    page(
        state,
        status,
        "movies.edit",
        json!({ "movie": movie, "genres": genres, "errors": errors, "old": old }),
    )
}

#[instrument(skip(state, form), fields(movie_id = id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: AppMultipart<MovieForm>,
) -> Result<Response, AppError> {
    let input = MovieInput::from_form(form.data).await?;
    let old = input.old_input();

    match catalog::update_movie(&state, id, input).await {
        Ok(_) => Ok(to_listing()),
        Err(AppError::InvalidFields(errors)) => {
            let movie = catalog::find_movie(&state.db, id).await?;
            edit_form(
                &state,
                movie.into(),
                StatusCode::UNPROCESSABLE_ENTITY,
                errors,
                old,
            )
            .await
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state), fields(movie_id = id))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    catalog::delete_movie(&state, id).await?;
    Ok(to_listing())
}

#[instrument(skip(state, form), fields(movie_id = id))]
pub async fn add_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppForm(form): AppForm<GenreSelection>,
) -> Result<Response, AppError> {
    match catalog::attach_genres(&state.db, id, &form.genre_ids).await {
        Ok(_) => Ok(to_listing()),
        Err(AppError::InvalidFields(errors)) => {
            show_page(&state, id, StatusCode::UNPROCESSABLE_ENTITY, errors).await
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, form), fields(movie_id = id))]
pub async fn delete_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppForm(form): AppForm<GenreSelection>,
) -> Result<Response, AppError> {
    match catalog::detach_genres(&state.db, id, &form.genre_ids).await {
        Ok(_) => Ok(to_listing()),
        Err(AppError::InvalidFields(errors)) => {
            show_page(&state, id, StatusCode::UNPROCESSABLE_ENTITY, errors).await
        }
        Err(e) => Err(e),
    }
}
