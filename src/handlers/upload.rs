use crate::models::{StoredPhoto, UploadPhotoResponse};
use crate::{photo, storage, AppError, AppState, Result};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const FILE_FIELD: &str = "file";

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// Read the `file` part, enforcing the per-photo size limit while streaming.
async fn read_file_field(
    multipart: &mut Multipart,
    max_size: u64,
    max_mb: u64,
) -> Result<Option<UploadedFile>> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        multipart_error(e.status(), e.body_text(), max_mb)
    })? {
        let name = field.name().unwrap_or("").to_string();
        tracing::debug!("Processing field: {}", name);

        if name != FILE_FIELD {
            continue;
        }

        let filename = field.file_name().unwrap_or("capture.jpg").to_string();
        let mut data = Vec::new();

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e.status(), e.body_text(), max_mb))?
        {
            if (data.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::FileTooLarge(max_mb));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Some(UploadedFile { filename, data }));
    }

    Ok(None)
}

// The body limit layer surfaces as a multipart error with status 413.
fn multipart_error(status: StatusCode, body: String, max_mb: u64) -> AppError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::FileTooLarge(max_mb),
        _ => AppError::BadRequest(format!("Failed to read form field: {}", body)),
    }
}

pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadPhotoResponse>> {
    tracing::info!("Received photo upload");

    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let file = read_file_field(
        &mut multipart,
        state.config.max_photo_size_bytes(),
        state.config.max_photo_size_mb,
    )
    .await?
    .ok_or_else(|| AppError::Validation("Field 'file' is required".to_string()))?;

    if file.data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let UploadedFile { filename, data } = file;
    let max_dimension = state.config.max_photo_dimension;
    let inspect_name = filename.clone();

    let (inspected, data) = tokio::task::spawn_blocking(move || {
        let inspected = photo::inspect_photo(&inspect_name, &data, max_dimension);
        (inspected, data)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Photo inspection task failed: {}", e)))?;
    let inspected = inspected?;

    let photo_id = Uuid::new_v4().to_string();
    let uploaded_at = Utc::now();
    let key = storage::build_photo_key(
        uploaded_at.date_naive(),
        &photo_id,
        inspected.extension(),
    );
    let size_bytes = data.len() as u64;

    state
        .storage
        .put(&key, data, inspected.content_type())
        .await?;

    tracing::info!(
        photo_id = %photo_id,
        key = %key,
        width = inspected.width,
        height = inspected.height,
        size_bytes,
        "Stored uploaded photo"
    );

    Ok(Json(UploadPhotoResponse {
        success: true,
        message: "Photo uploaded successfully".to_string(),
        photo: StoredPhoto {
            id: photo_id,
            url: format!("/{}", key),
            key,
            original_filename: filename,
            content_type: inspected.content_type().to_string(),
            size_bytes,
            width: inspected.width,
            height: inspected.height,
            uploaded_at,
        },
    }))
}
