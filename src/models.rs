use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    #[serde(rename = "Message")]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Metadata for a photo that has been validated and stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPhoto {
    pub id: String,
    pub key: String,
    pub url: String,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadPhotoResponse {
    pub success: bool,
    pub message: String,
    pub photo: StoredPhoto,
}
