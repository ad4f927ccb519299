//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{
    AuthResponse, DeleteResponse, LoginRequest, MeResponse, MediaEnvelope, MediaResponse,
    PaginationMeta, RenameRequest, SignupRequest, UserInfo,
};
use super::handlers::{
    self, delete_media, get_media, list_media, login, me, rename_media, replace_media, signup,
    upload_media, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState, BLOB_PATH_PREFIX};
use crate::media::MediaType;

/// Room left in the request body for multipart framing and form fields.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// OpenAPI document for the Web API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediabox API",
        description = "Upload, rename, replace and delete images and videos"
    ),
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::me,
        handlers::media::upload_media,
        handlers::media::rename_media,
        handlers::media::replace_media,
        handlers::media::delete_media,
        handlers::media::get_media,
        handlers::media::list_media,
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        RenameRequest,
        UserInfo,
        AuthResponse,
        MeResponse,
        MediaType,
        MediaResponse,
        MediaEnvelope,
        DeleteResponse,
        PaginationMeta,
    )),
    tags(
        (name = "auth", description = "Accounts and tokens"),
        (name = "media", description = "Media library"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Request body limit for media forms carrying a file of up to `max_file_bytes`.
fn multipart_body_limit(max_file_bytes: u64) -> usize {
    usize::try_from(max_file_bytes.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let body_limit = multipart_body_limit(app_state.policy.max_bytes());

    let auth_routes = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me));

    let media_routes = Router::new()
        .route("/", get(list_media))
        .route("/upload", post(upload_media))
        .route("/rename", patch(rename_media))
        .route("/replace", put(replace_media))
        .route("/delete", delete(delete_media))
        .route("/:id", get(get_media))
        .layer(DefaultBodyLimit::max(body_limit));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/media", media_routes);

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Serve the OpenAPI document and Swagger UI.
pub fn create_swagger_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Serve objects of the local blob store under [`BLOB_PATH_PREFIX`].
pub fn create_blob_router(base_path: &Path) -> Router {
    Router::new().nest_service(BLOB_PATH_PREFIX, ServeDir::new(base_path))
}
