//! API error handling for the mediabox Web API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::MediaError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed request or rejected media (400).
    InvalidInput,
    /// Field-level DTO validation failure (400).
    ValidationError,
    /// Missing or invalid credential (401).
    Unauthorized,
    /// Caller does not own the resource (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Conflict (409).
    Conflict,
    /// Upload above the size ceiling (413).
    PayloadTooLarge,
    /// Blob store failure (500).
    StorageError,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::StorageError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Field-level validation errors, or the underlying cause in dev mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

/// Name of a DTO field as it appears in JSON bodies (camelCase).
fn wire_field_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = !name.is_empty();
        } else if upper_next {
            name.extend(c.to_uppercase());
            upper_next = false;
        } else {
            name.push(c);
        }
    }
    name
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with field-level details.
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field-level details, if any.
    pub fn details(&self) -> Option<&HashMap<String, Vec<String>>> {
        self.details.as_ref()
    }

    /// Create an invalid input error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a validation error with field-level details.
    pub fn validation(details: HashMap<String, Vec<String>>) -> Self {
        Self::with_details(ErrorCode::ValidationError, "Validation failed", details)
    }

    /// Create a validation error from validator::ValidationErrors.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut details: HashMap<String, Vec<String>> = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            details.insert(wire_field_name(field), messages);
        }

        Self::validation(details)
    }

    /// Convert a domain error, attaching its text as `details.cause` when
    /// `expose_cause` is set.
    pub fn from_media_error(err: MediaError, expose_cause: bool) -> Self {
        let cause = err.to_string();
        let mut api = Self::from(err);
        if expose_cause && api.details.is_none() {
            api.details = Some(HashMap::from([("cause".to_string(), vec![cause])]));
        }
        api
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Unauthorized(msg) => ApiError::unauthorized(msg),
            MediaError::Forbidden(msg) => ApiError::forbidden(msg),
            MediaError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            MediaError::InvalidInput(msg) => ApiError::bad_request(msg),
            MediaError::Conflict(msg) => ApiError::conflict(msg),
            MediaError::TooLarge { max, .. } => ApiError::payload_too_large(format!(
                "File too large (max {}MB)",
                max / 1024 / 1024
            )),
            MediaError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                ApiError::storage("Media storage operation failed")
            }
            other => {
                tracing::error!("Internal error: {}", other);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status() {
        assert_eq!(ErrorCode::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::ValidationError.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ErrorCode::StorageError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::PayloadTooLarge).unwrap(),
            "\"PAYLOAD_TOO_LARGE\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::StorageError).unwrap(),
            "\"STORAGE_ERROR\""
        );
    }

    #[test]
    fn test_from_media_error() {
        let cases = [
            (MediaError::Unauthorized("x".into()), ErrorCode::Unauthorized),
            (MediaError::Forbidden("x".into()), ErrorCode::Forbidden),
            (MediaError::NotFound("Media".into()), ErrorCode::NotFound),
            (MediaError::InvalidInput("x".into()), ErrorCode::InvalidInput),
            (MediaError::Conflict("x".into()), ErrorCode::Conflict),
            (
                MediaError::TooLarge { size: 2, max: 1 },
                ErrorCode::PayloadTooLarge,
            ),
            (MediaError::Storage("x".into()), ErrorCode::StorageError),
            (MediaError::Database("x".into()), ErrorCode::InternalError),
            (MediaError::Internal("x".into()), ErrorCode::InternalError),
        ];

        for (err, code) in cases {
            assert_eq!(ApiError::from(err).code(), code);
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::from(MediaError::NotFound("Media".into()));
        assert_eq!(err.message(), "Media not found");
    }

    #[test]
    fn test_cause_hidden_by_default() {
        let err = ApiError::from_media_error(MediaError::Storage("timeout".into()), false);
        assert!(err.details.is_none());
        assert_eq!(err.message(), "Media storage operation failed");
    }

    #[test]
    fn test_cause_exposed_in_dev_mode() {
        let err = ApiError::from_media_error(MediaError::Storage("timeout".into()), true);
        let details = err.details.unwrap();
        assert_eq!(details["cause"], vec!["storage error: timeout".to_string()]);
    }

    #[test]
    fn test_validation_error() {
        let mut details = HashMap::new();
        details.insert("newName".to_string(), vec!["Required".to_string()]);

        let err = ApiError::validation(details);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(
            err.details.unwrap().get("newName").unwrap(),
            &vec!["Required".to_string()]
        );
    }

    #[test]
    fn test_wire_field_name() {
        assert_eq!(wire_field_name("new_name"), "newName");
        assert_eq!(wire_field_name("media_id"), "mediaId");
        assert_eq!(wire_field_name("email"), "email");
    }
}
