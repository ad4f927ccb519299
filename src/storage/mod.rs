//! Blob storage for mediabox.
//!
//! Media content lives outside the database, in a blob store addressed by a
//! remote identifier of the form `media/<owner_id>/<name>.<ext>`. Two backends
//! implement [`BlobStore`]:
//! - [`CloudinaryStore`]: the Cloudinary upload API over HTTPS
//! - [`LocalBlobStore`]: a directory tree on local disk (development, tests)

mod cloudinary;
mod local;

pub use cloudinary::CloudinaryStore;
pub use local::LocalBlobStore;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::{MediaError, Result};

/// Largest payload accepted by a single inline upload (10 MiB).
pub const INLINE_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

/// Result of a successful upload or rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Identifier of the object inside the store.
    pub remote_id: String,
    /// Public delivery URL.
    pub url: String,
}

/// Kind of resource as the remote service classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Images (the default).
    Image,
    /// Video containers.
    Video,
    /// Documents and other opaque files.
    Raw,
}

impl ResourceKind {
    /// Classify a bare file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "json" | "txt" | "pdf" | "doc" | "docx" | "xls" | "xlsx" | "csv" | "sql" => {
                ResourceKind::Raw
            }
            "mp4" | "mov" | "avi" | "wmv" | "flv" | "webm" | "mkv" => ResourceKind::Video,
            _ => ResourceKind::Image,
        }
    }

    /// Infer the resource kind from the extension embedded in a remote id.
    ///
    /// Identifiers without an extension are treated as images.
    pub fn from_remote_id(remote_id: &str) -> Self {
        let last = remote_id.rsplit('/').next().unwrap_or(remote_id);
        match last.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension(ext),
            _ => ResourceKind::Image,
        }
    }

    /// Convert to the path segment the remote API uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
            ResourceKind::Raw => "raw",
        }
    }
}

/// Storage backend for media content.
///
/// Implementations must be safe to share between request tasks.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` under `folder`.
    ///
    /// `desired_id` becomes the last segment of the remote id; a UUID is
    /// generated when it is `None`.
    async fn upload(
        &self,
        content: &[u8],
        folder: &str,
        desired_id: Option<&str>,
    ) -> Result<StoredObject>;

    /// Delete an object. Returns `false` if it did not exist.
    async fn delete(&self, remote_id: &str) -> Result<bool>;

    /// Move an object to a new identifier.
    async fn rename(&self, from_remote_id: &str, to_remote_id: &str) -> Result<StoredObject>;

    /// Retrieve an object's content, or `None` if it does not exist.
    async fn fetch(&self, remote_id: &str) -> Result<Option<Vec<u8>>>;

    /// Short backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Build the blob store selected by the configuration.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalBlobStore::new(&config.local_path, &config.local_base_url)?;
            info!("Local blob store initialized at: {}", config.local_path);
            Ok(Arc::new(store))
        }
        StorageBackend::Cloudinary => {
            let store = CloudinaryStore::new(config)?;
            info!("Cloudinary blob store initialized for cloud: {}", config.cloud_name);
            Ok(Arc::new(store))
        }
    }
}

/// Join a folder and an object name into a remote id.
pub fn join_remote_id(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Folder holding every object owned by a user.
pub fn owner_folder(owner_id: i64) -> String {
    format!("media/{owner_id}")
}

/// Split a remote id into its folder and last segment.
pub fn split_remote_id(remote_id: &str) -> (&str, &str) {
    match remote_id.rsplit_once('/') {
        Some((folder, name)) => (folder, name),
        None => ("", remote_id),
    }
}

/// Longest extension taken over from a client file name.
pub const MAX_EXTENSION_LENGTH: usize = 10;

/// Extract the lowercase extension (without dot) from a file name.
///
/// Only extensions of up to [`MAX_EXTENSION_LENGTH`] ASCII alphanumerics are
/// returned, so the result is always usable in a remote id.
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && s.len() <= MAX_EXTENSION_LENGTH)
        .filter(|s| s.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|s| s.to_ascii_lowercase())
}

/// Check that a remote id is a relative path of safe segments.
///
/// Each segment must be non-empty, must not be `.` or `..`, and may only
/// contain ASCII alphanumerics, `-`, `_` and `.`.
pub fn validate_remote_id(remote_id: &str) -> Result<()> {
    if remote_id.is_empty() {
        return Err(MediaError::Storage("empty remote id".to_string()));
    }

    for segment in remote_id.split('/') {
        let valid = !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(MediaError::Storage(format!("invalid remote id: {remote_id}")));
        }
    }

    Ok(())
}

/// Reject payloads above the inline upload ceiling.
pub(crate) fn check_inline_limit(content: &[u8]) -> Result<()> {
    if content.len() > INLINE_UPLOAD_LIMIT {
        return Err(MediaError::Storage(format!(
            "file size {} exceeds the {} byte upload limit",
            content.len(),
            INLINE_UPLOAD_LIMIT
        )));
    }
    Ok(())
}
