//! Request body extraction and field validation.
//!
//! Handlers that must authorize against a stored record before judging the
//! payload take [`ApiJson`] and call [`validate_request`] once ownership is
//! settled. The rest use [`ValidatedJson`], which does both up front.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// JSON body whose rejection is rendered in the API error format.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))
    }
}

/// JSON body that must also pass its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate + Send,
    ApiJson<T>: FromRequest<S, Rejection = ApiError>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(value) = ApiJson::<T>::from_request(req, state).await?;
        validate_request(&value)?;
        Ok(ValidatedJson(value))
    }
}

/// Run the `validator` rules of a parsed body.
pub fn validate_request<T: Validate>(value: &T) -> Result<(), ApiError> {
    value.validate().map_err(ApiError::from_validation_errors)
}

/// Reject strings that are blank after trimming.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::dto::RenameRequest;
    use crate::web::error::ErrorCode;

    #[test]
    fn test_not_empty_trimmed() {
        assert!(not_empty_trimmed("Hello").is_ok());
        assert!(not_empty_trimmed("  Hello  ").is_ok());
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed("\t\n").is_err());
    }

    #[test]
    fn test_validate_request_reports_wire_field_names() {
        let req = RenameRequest {
            media_id: 1,
            new_name: "   ".into(),
        };

        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let details = err.details().unwrap();
        assert!(details.contains_key("newName"));
        assert!(!details.contains_key("new_name"));
    }

    #[test]
    fn test_validate_request_accepts_valid_body() {
        let req = RenameRequest {
            media_id: 1,
            new_name: "holiday".into(),
        };
        assert!(validate_request(&req).is_ok());
    }
}
