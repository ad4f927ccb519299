//! API handlers for the mediabox Web API.

pub mod auth;
pub mod media;

pub use auth::*;
pub use media::*;

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::db::{Database, User};
use crate::media::{MediaCatalog, MediaPolicy};
use crate::storage::BlobStore;
use crate::web::error::ApiError;
use crate::web::middleware::JwtClaims;
use crate::MediaError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Database,
    /// Blob store holding media content.
    pub store: Arc<dyn BlobStore>,
    /// Upload acceptance rules.
    pub policy: MediaPolicy,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Token lifetime in seconds.
    pub token_expiry: u64,
    /// Include underlying error text in error responses.
    pub dev_mode: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Database,
        store: Arc<dyn BlobStore>,
        policy: MediaPolicy,
        jwt_secret: &str,
        token_expiry: u64,
    ) -> Self {
        Self {
            db,
            store,
            policy,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry,
            dev_mode: false,
        }
    }

    /// Enable or disable development mode.
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// Media catalog over this state's database and blob store.
    pub fn catalog(&self) -> MediaCatalog<'_> {
        MediaCatalog::new(&self.db, self.store.as_ref())
    }

    /// Convert a domain error into a response, honoring development mode.
    pub fn api_error(&self, err: MediaError) -> ApiError {
        ApiError::from_media_error(err, self.dev_mode)
    }

    /// Generate a bearer token for a user.
    pub fn generate_token(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }
}
