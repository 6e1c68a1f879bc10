use std::str::FromStr;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::StoredPath;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/storage/{area}/{file}",
    tag = "Assets",
    operation_id = "getAsset",
    summary = "Download a stored asset",
    description = "Streams a poster, banner, media file or trailer by the stored path recorded on a movie. Stored paths are content-addressed, so responses carry the content hash as a strong ETag and are cacheable indefinitely.",
    params(
        ("area" = String, Path, description = "Storage area: `images`, `media` or `trailer`"),
        ("file" = String, Path, description = "`{sha256}.{ext}`"),
    ),
    responses(
        (status = 200, description = "Asset content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn serve_asset(
    State(state): State<AppState>,
    Path((area, file)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = StoredPath::from_str(&format!("{area}/{file}"))
        .map_err(|_| AppError::NotFound("Asset not found".into()))?;

    let etag_value = format!("\"{}\"", path.hash());
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && val.split(',').any(|tag| {
            let tag = tag.trim();
            tag == etag_value || tag == "*"
        })
        && state.blob_store.exists(&path).await?
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let size = state.blob_store.size(&path).await?;
    let reader = state.blob_store.get_stream(&path).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_ext(path.extension()).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
