use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    R2,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // Front-end origins allowed to call the API with credentials
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_max_photo_size")]
    pub max_photo_size_mb: u64,

    #[serde(default = "default_max_photo_dimension")]
    pub max_photo_dimension: u32,

    #[serde(default)]
    pub storage_backend: StorageBackend,

    #[serde(default = "default_photo_dir")]
    pub photo_dir: String,

    // R2 settings, only required when STORAGE_BACKEND=r2
    pub r2_account_id: Option<String>,
    pub r2_access_key_id: Option<String>,
    pub r2_secret_access_key: Option<String>,
    #[serde(default = "default_bucket_name")]
    pub r2_bucket_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_max_photo_size() -> u64 {
    10
}

fn default_max_photo_dimension() -> u32 {
    8192
}

fn default_photo_dir() -> String {
    "./data/photos".to_string()
}

fn default_bucket_name() -> String {
    "doodle-photos".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_allowed_origins(),
            max_photo_size_mb: default_max_photo_size(),
            max_photo_dimension: default_max_photo_dimension(),
            storage_backend: StorageBackend::default(),
            photo_dir: default_photo_dir(),
            r2_account_id: None,
            r2_access_key_id: None,
            r2_secret_access_key: None,
            r2_bucket_name: default_bucket_name(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn max_photo_size_bytes(&self) -> u64 {
        self.max_photo_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_request_body_bytes(&self) -> usize {
        // Allow some overhead for multipart boundaries/headers.
        let bytes = self
            .max_photo_size_mb
            .saturating_add(1)
            .saturating_mul(1024 * 1024);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }

    pub fn r2_endpoint(&self) -> Option<String> {
        self.r2_account_id
            .as_deref()
            .map(|account| format!("https://{}.r2.cloudflarestorage.com", account))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
