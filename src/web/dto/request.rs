//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::not_empty_trimmed;

/// Default page size for listings.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// Signup request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// Username (3-30 letters, digits or underscores).
    #[validate(length(min = 3, max = 30, message = "Must be 3-30 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128, message = "Must be 8-128 characters"))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Rename request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// Media ID.
    pub media_id: i64,
    /// New display name.
    #[validate(
        length(max = 255, message = "Must be at most 255 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub new_name: String,
}

/// Query for `DELETE /api/media/delete`.
///
/// `id` stays a string so a missing or malformed value produces a JSON 400.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Media ID.
    pub id: Option<String>,
}

impl DeleteQuery {
    /// Parse the media ID.
    pub fn media_id(&self) -> Option<i64> {
        self.id.as_deref().and_then(|id| id.trim().parse().ok())
    }
}

/// Query for `GET /api/media`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MediaListQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Only `image` or `video`.
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl MediaListQuery {
    /// Clamp page and page size to sane values.
    pub fn normalized(&self) -> (u32, u32) {
        (self.page.max(1), self.per_page.clamp(1, MAX_PER_PAGE))
    }

    /// Convert to SQL offset and limit.
    pub fn to_offset_limit(&self) -> (i64, i64) {
        let (page, per_page) = self.normalized();
        (
            ((page - 1) as i64) * per_page as i64,
            per_page as i64,
        )
    }
}
