//! Media asset types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::file_extension;

/// Kind of media accepted by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image.
    Image,
    /// Video clip.
    Video,
}

impl MediaType {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            _ => Err(format!("unknown media type: {s}")),
        }
    }
}

/// A stored media asset.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaAsset {
    /// Unique asset ID.
    pub id: i64,
    /// Owning user.
    pub owner_id: i64,
    /// Name shown to the user.
    pub original_name: String,
    /// File name including extension.
    pub stored_name: String,
    /// Identifier of the content in the blob store.
    pub remote_id: String,
    /// Public delivery URL.
    pub remote_url: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Image or video.
    pub media_type: MediaType,
    /// Content size in bytes.
    pub size_bytes: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Last modification timestamp.
    pub updated_at: String,
}

impl MediaAsset {
    /// Check whether `user_id` owns this asset.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    /// Extension (lowercase, without dot) of the remote object.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.remote_id)
    }
}

/// Input for creating an asset through the catalog.
#[derive(Debug, Clone)]
pub struct NewMedia {
    /// Owning user.
    pub owner_id: i64,
    /// Name shown to the user.
    pub original_name: String,
    /// File name including extension.
    pub stored_name: String,
    /// Content to upload.
    pub content: Vec<u8>,
    /// MIME type of the content.
    pub content_type: String,
    /// Image or video.
    pub media_type: MediaType,
}

/// Fully resolved row data for an insert.
#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub owner_id: i64,
    pub original_name: String,
    pub stored_name: String,
    pub remote_id: String,
    pub remote_url: String,
    pub content_type: String,
    pub media_type: MediaType,
    pub size_bytes: i64,
}

/// Pagination parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination {
    /// Number of items to skip.
    pub offset: i64,
    /// Maximum number of items to return.
    pub limit: i64,
}

impl Pagination {
    /// Create new pagination parameters.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items (across all pages).
    pub total: i64,
}

/// Usual extensions for types whose MIME table entry lists a rarer one first.
const PREFERRED_EXTENSIONS: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/tiff", "tif"),
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
];

/// Pick the extension for stored content.
///
/// Taken from the original file name when it has a plain alphanumeric one,
/// otherwise from the MIME type, falling back to `bin`.
pub fn extension_for(original_name: &str, content_type: &str) -> String {
    if let Some(ext) = file_extension(original_name) {
        return ext;
    }

    if let Some((_, ext)) = PREFERRED_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type))
    {
        return ext.to_string();
    }

    mime_guess::get_mime_extensions_str(content_type)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| "bin".to_string())
}

/// Build the stored file name from an optional custom id.
///
/// Without a custom id a fresh UUID is used as the stem.
pub fn stored_file_name(custom_id: Option<&str>, extension: &str) -> String {
    let stem = match custom_id {
        Some(id) => id.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    format!("{stem}.{extension}")
}
