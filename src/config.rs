//! Configuration module for mediabox.

use serde::Deserialize;
use std::path::Path;

use crate::storage::INLINE_UPLOAD_LIMIT;
use crate::{MediaError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL for the SQLite database.
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

fn default_db_url() -> String {
    "sqlite://data/mediabox.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_db_max_connections(),
        }
    }
}

/// Blob store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Sharded directory on the local filesystem.
    #[default]
    Local,
    /// Cloudinary upload API.
    Cloudinary,
}

/// Digest used to sign Cloudinary requests.
///
/// Cloudinary checks SHA-1 signatures unless the product environment was
/// switched to SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// Blob store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
    /// Public base URL under which the local backend's objects are reachable.
    #[serde(default = "default_local_base_url")]
    pub local_base_url: String,
    /// Cloudinary cloud name.
    #[serde(default)]
    pub cloud_name: String,
    /// Cloudinary API key.
    #[serde(default)]
    pub api_key: String,
    /// Cloudinary API secret.
    #[serde(default)]
    pub api_secret: String,
    /// Base URL of the Cloudinary API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Digest for request signatures.
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
}

fn default_local_path() -> String {
    "data/blobs".to_string()
}

fn default_local_base_url() -> String {
    "http://localhost:8080/blobs".to_string()
}

fn default_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_path: default_local_path(),
            local_base_url: default_local_base_url(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: default_api_base(),
            signature_algorithm: SignatureAlgorithm::default(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
        }
    }
}

/// Upload policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// MIME types accepted as images.
    #[serde(default = "default_image_types")]
    pub image_types: Vec<String>,
    /// MIME types accepted as videos.
    #[serde(default = "default_video_types")]
    pub video_types: Vec<String>,
}

fn default_max_upload_size() -> u64 {
    10
}

fn default_image_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/gif", "image/webp", "image/bmp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_video_types() -> Vec<String> {
    [
        "video/mp4",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-ms-wmv",
        "video/x-flv",
        "video/x-matroska",
        "video/webm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl MediaConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size(),
            image_types: default_image_types(),
            video_types: default_video_types(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (empty for console only).
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mediabox.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Token expiry in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Include internal error details in responses.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_jwt_expiry() -> u64 {
    7 * 24 * 60 * 60 // 7 days
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_expiry_secs: default_jwt_expiry(),
            dev_mode: false,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload policy.
    #[serde(default)]
    pub media: MediaConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(MediaError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MediaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MEDIABOX_JWT_SECRET`
    /// - `MEDIABOX_DATABASE_URL`
    /// - `MEDIABOX_CLOUD_NAME`, `MEDIABOX_CLOUD_API_KEY`, `MEDIABOX_CLOUD_API_SECRET`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 5] = [
            ("MEDIABOX_JWT_SECRET", &mut self.web.jwt_secret),
            ("MEDIABOX_DATABASE_URL", &mut self.database.url),
            ("MEDIABOX_CLOUD_NAME", &mut self.storage.cloud_name),
            ("MEDIABOX_CLOUD_API_KEY", &mut self.storage.api_key),
            ("MEDIABOX_CLOUD_API_SECRET", &mut self.storage.api_secret),
        ];

        for (name, target) in overrides {
            if let Ok(value) = std::env::var(name) {
                if !value.is_empty() {
                    *target = value;
                }
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - the Cloudinary backend is selected without complete credentials
    /// - the active backend's base URL does not parse
    /// - the upload ceiling is zero or above what the blob store accepts inline
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(MediaError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via MEDIABOX_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Cloudinary
            && (self.storage.cloud_name.is_empty()
                || self.storage.api_key.is_empty()
                || self.storage.api_secret.is_empty())
        {
            return Err(MediaError::Config(
                "cloudinary backend requires cloud_name, api_key and api_secret".to_string(),
            ));
        }

        let base_url = match self.storage.backend {
            StorageBackend::Local => ("storage.local_base_url", &self.storage.local_base_url),
            StorageBackend::Cloudinary => ("storage.api_base", &self.storage.api_base),
        };
        url::Url::parse(base_url.1).map_err(|e| {
            MediaError::Config(format!("{} is not a valid URL: {e}", base_url.0))
        })?;

        if self.media.max_upload_size_mb == 0 {
            return Err(MediaError::Config(
                "media.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }

        if self.media.max_upload_bytes() > INLINE_UPLOAD_LIMIT as u64 {
            return Err(MediaError::Config(format!(
                "media.max_upload_size_mb must be at most {}",
                INLINE_UPLOAD_LIMIT / (1024 * 1024)
            )));
        }

        Ok(())
    }
}
