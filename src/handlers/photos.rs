use crate::{storage, AppError, AppState, Result};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Serve a stored photo by the key returned from `/upload-photo`.
pub async fn get_photo(
    State(state): State<Arc<AppState>>,
    key: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(key) = key.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let key = format!("{}/{}", storage::PHOTO_PREFIX, key);
    let (data, content_type) = state.storage.get(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        data,
    )
        .into_response())
}
