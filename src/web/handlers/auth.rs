//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth;
use crate::db::UserRepository;
use crate::web::dto::{AuthResponse, LoginRequest, MeResponse, SignupRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// POST /api/auth/signup - Create an account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username already registered")
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = auth::signup(
        &repo,
        auth::SignupRequest::new(req.username, req.email, req.password),
    )
    .await
    .map_err(|e| state.api_error(e))?;

    let token = state.generate_token(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = repo
        .get_by_email(&req.email)
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    auth::verify_password(&req.password, &user.password)
        .map_err(|_| ApiError::unauthorized(INVALID_CREDENTIALS))?;

    let token = state.generate_token(&user)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// GET /api/auth/me - Current user.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = repo
        .get_by_id(claims.sub)
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(Json(MeResponse { user: user.into() }))
}
