//! Error types for mediabox.

use thiserror::Error;

/// Common error type for mediabox.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Missing, malformed or expired credential.
    #[error("authentication error: {0}")]
    Unauthorized(String),

    /// Authenticated, but the caller does not own the resource.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request, missing field or media type mismatch.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unique constraint violated (duplicate email or username).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Payload exceeds the configured ceiling.
    #[error("payload too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Size of the rejected payload.
        size: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// Remote blob store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Database error.
    ///
    /// Errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MediaError {
    fn from(e: sqlx::Error) -> Self {
        MediaError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for MediaError {
    fn from(e: reqwest::Error) -> Self {
        MediaError::Storage(e.to_string())
    }
}

/// Result type alias for mediabox operations.
pub type Result<T> = std::result::Result<T, MediaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_display() {
        let err = MediaError::Unauthorized("token expired".to_string());
        assert_eq!(err.to_string(), "authentication error: token expired");
    }

    #[test]
    fn test_forbidden_display() {
        let err = MediaError::Forbidden("not the owner".to_string());
        assert_eq!(err.to_string(), "permission denied: not the owner");
    }

    #[test]
    fn test_not_found_display() {
        let err = MediaError::NotFound("media".to_string());
        assert_eq!(err.to_string(), "media not found");
    }

    #[test]
    fn test_too_large_display() {
        let err = MediaError::TooLarge { size: 20, max: 10 };
        assert_eq!(
            err.to_string(),
            "payload too large: 20 bytes (max 10 bytes)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MediaError = io_err.into();
        assert!(matches!(err, MediaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: MediaError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, MediaError::Database(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(MediaError::Storage("remote rejected".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
