//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::media::{MediaAsset, MediaType};

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    /// Response data.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Create a new paginated response.
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
}

/// Public view of a user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Signup and login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// The authenticated user.
    pub user: UserInfo,
    /// Bearer token (JWT).
    pub token: String,
}

/// Current user response (for /api/auth/me).
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// The authenticated user.
    pub user: UserInfo,
}

/// Public view of a media asset.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    /// Media ID.
    pub id: i64,
    /// Owning user.
    pub owner_id: i64,
    /// Display name.
    pub original_name: String,
    /// Stored file name including extension.
    pub file_name: String,
    /// MIME type.
    pub file_type: String,
    /// `image` or `video`.
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Size in bytes.
    pub file_size: i64,
    /// Delivery URL.
    pub url: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last modification timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<MediaAsset> for MediaResponse {
    fn from(asset: MediaAsset) -> Self {
        Self {
            id: asset.id,
            owner_id: asset.owner_id,
            original_name: asset.original_name,
            file_name: asset.stored_name,
            file_type: asset.content_type,
            media_type: asset.media_type,
            file_size: asset.size_bytes,
            url: asset.remote_url,
            created_at: to_rfc3339(&asset.created_at),
            updated_at: to_rfc3339(&asset.updated_at),
        }
    }
}

/// Single media response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MediaEnvelope {
    /// The media asset.
    pub media: MediaResponse,
}

impl From<MediaAsset> for MediaEnvelope {
    fn from(asset: MediaAsset) -> Self {
        Self {
            media: asset.into(),
        }
    }
}

/// Delete response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// Always `true` on success.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> MediaAsset {
        MediaAsset {
            id: 3,
            owner_id: 1,
            original_name: "photo.jpg".to_string(),
            stored_name: "abc.jpg".to_string(),
            remote_id: "media/1/abc.jpg".to_string(),
            remote_url: "http://localhost/blobs/media/1/abc.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            media_type: MediaType::Image,
            size_bytes: 2048,
            created_at: "2024-05-01 10:00:00".to_string(),
            updated_at: "2024-05-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_media_response_shape() {
        let json = serde_json::to_value(MediaEnvelope::from(asset())).unwrap();
        let media = &json["media"];

        assert_eq!(media["id"], 3);
        assert_eq!(media["ownerId"], 1);
        assert_eq!(media["originalName"], "photo.jpg");
        assert_eq!(media["fileName"], "abc.jpg");
        assert_eq!(media["fileType"], "image/jpeg");
        assert_eq!(media["type"], "image");
        assert_eq!(media["fileSize"], 2048);
        assert_eq!(media["url"], "http://localhost/blobs/media/1/abc.jpg");
        assert_eq!(media["createdAt"], "2024-05-01T10:00:00Z");
        assert!(media.get("remoteId").is_none());
    }

    #[test]
    fn test_paginated_response() {
        let resp = PaginatedResponse::new(vec![1, 2], 2, 2, 5);
        let json = serde_json::to_value(resp).unwrap();

        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["page"], 2);
        assert_eq!(json["meta"]["per_page"], 2);
        assert_eq!(json["meta"]["total"], 5);
    }
}
