use crate::config::{Config, StorageBackend};
use crate::{AppError, Result};
use aws_sdk_s3::primitives::ByteStream;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const PHOTO_PREFIX: &str = "photos";

/// Where uploaded photos end up.
pub enum Storage {
    Local { root: PathBuf },
    R2 { client: aws_sdk_s3::Client, bucket: String },
}

impl Storage {
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.storage_backend {
            StorageBackend::Local => Ok(Self::local(&config.photo_dir)),
            StorageBackend::R2 => {
                let (Some(endpoint), Some(access_key), Some(secret_key)) = (
                    config.r2_endpoint(),
                    config.r2_access_key_id.as_deref(),
                    config.r2_secret_access_key.as_deref(),
                ) else {
                    return Err(AppError::Internal(
                        "STORAGE_BACKEND=r2 requires R2_ACCOUNT_ID, R2_ACCESS_KEY_ID and R2_SECRET_ACCESS_KEY"
                            .to_string(),
                    ));
                };

                // Avoid aws-config; R2 only needs a static endpoint and credentials.
                let s3_config = aws_sdk_s3::Config::builder()
                    .endpoint_url(endpoint)
                    .credentials_provider(aws_sdk_s3::config::Credentials::new(
                        access_key, secret_key, None, None, "r2",
                    ))
                    .region(aws_sdk_s3::config::Region::new("auto"))
                    .build();

                Ok(Self::R2 {
                    client: aws_sdk_s3::Client::from_conf(s3_config),
                    bucket: config.r2_bucket_name.clone(),
                })
            }
        }
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local { root: root.into() }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Local { root } => format!("local:{}", root.display()),
            Self::R2 { bucket, .. } => format!("r2:{}", bucket),
        }
    }

    pub async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        validate_key(key)?;

        match self {
            Self::Local { root } => {
                let path = root.join(key);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::Storage(format!("Failed to create {}: {}", parent.display(), e))
                    })?;
                }
                tokio::fs::write(&path, data)
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to write file: {}", e)))?;
            }
            Self::R2 { client, bucket } => {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(ByteStream::from(data))
                    .content_type(content_type)
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to upload file: {}", e)))?;
            }
        }

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<(Vec<u8>, String)> {
        validate_key(key)?;

        match self {
            Self::Local { root } => {
                let path = root.join(key);
                let data = tokio::fs::read(&path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        AppError::NotFound("Photo not found".to_string())
                    } else {
                        AppError::Storage(format!("Failed to read file: {}", e))
                    }
                })?;
                Ok((data, content_type_from_key(key)))
            }
            Self::R2 { client, bucket } => {
                let response = client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| {
                        let service_error = e.into_service_error();
                        if service_error.is_no_such_key() {
                            AppError::NotFound("Photo not found".to_string())
                        } else {
                            AppError::Storage(format!("Failed to download file: {}", service_error))
                        }
                    })?;

                let content_type = response
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| content_type_from_key(key));

                let data = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to read file: {}", e)))?
                    .into_bytes()
                    .to_vec();

                Ok((data, content_type))
            }
        }
    }
}

fn content_type_from_key(key: &str) -> String {
    mime_guess::from_path(Path::new(key))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn build_photo_key(date: NaiveDate, photo_id: &str, ext: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        PHOTO_PREFIX,
        date.format("%Y-%m-%d"),
        photo_id,
        ext
    )
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");

    if bad {
        return Err(AppError::BadRequest(format!("Invalid photo key: {}", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_photo_key() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(
            build_photo_key(date, "abc", "jpg"),
            "photos/2026-10-17/abc.jpg"
        );
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("photos/2026-10-17/abc.jpg").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("photos/../secret").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("photos//abc.jpg").is_err());
        assert!(validate_key("photos\\abc.jpg").is_err());
        assert!(validate_key("photos/./abc.jpg").is_err());
    }

    #[tokio::test]
    async fn test_local_put_get() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::local(temp_dir.path());

        storage
            .put("photos/2026-10-17/a.png", b"png bytes".to_vec(), "image/png")
            .await
            .unwrap();

        let (data, content_type) = storage.get("photos/2026-10-17/a.png").await.unwrap();
        assert_eq!(data, b"png bytes");
        assert_eq!(content_type, "image/png");
        assert!(temp_dir.path().join("photos/2026-10-17/a.png").exists());
    }

    #[tokio::test]
    async fn test_local_get_missing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::local(temp_dir.path());

        let result = storage.get("photos/2026-10-17/missing.jpg").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_r2_requires_credentials() {
        let config = Config {
            storage_backend: StorageBackend::R2,
            ..Config::default()
        };
        assert!(matches!(
            Storage::from_config(&config),
            Err(AppError::Internal(_))
        ));
    }
}
