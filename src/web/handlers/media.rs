//! Media handlers for Web API.
//!
//! Every mutating handler runs the same checks before touching the blob
//! store: authenticate, load the asset, check ownership, validate input.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::media::{
    extension_for, stored_file_name, validate_custom_id, validate_rename, MediaAsset, MediaType,
    NewMedia, Pagination, Replacement,
};
use crate::web::dto::{
    DeleteQuery, DeleteResponse, MediaEnvelope, MediaListQuery, MediaResponse, PaginatedResponse,
    validate_request, ApiJson, RenameRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// A file part read from a multipart body.
#[derive(Debug)]
struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    content: Vec<u8>,
}

/// Fields accepted by the upload and replace forms.
#[derive(Debug, Default)]
struct MediaForm {
    file: Option<UploadedFile>,
    custom_id: Option<String>,
    id: Option<String>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("Request body too large");
    }
    tracing::debug!("Failed to read multipart body: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

async fn read_form(mut multipart: Multipart) -> Result<MediaForm, ApiError> {
    let mut form = MediaForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let content = field.bytes().await.map_err(multipart_error)?.to_vec();
                form.file = Some(UploadedFile {
                    filename,
                    content_type,
                    content,
                });
            }
            "customId" => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = value.trim();
                if !value.is_empty() {
                    form.custom_id = Some(value.to_string());
                }
            }
            "id" => {
                form.id = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Classify and size-check an uploaded file.
fn accept_file(state: &AppState, file: &UploadedFile) -> Result<MediaType, ApiError> {
    let media_type = state
        .policy
        .classify(file.content_type.as_deref(), &file.filename)
        .map_err(|e| state.api_error(e))?;

    state
        .policy
        .check_size(file.content.len() as u64)
        .map_err(|e| state.api_error(e))?;

    Ok(media_type)
}

/// Load an asset and check that `user_id` owns it.
async fn load_owned(state: &AppState, id: i64, user_id: i64) -> Result<MediaAsset, ApiError> {
    let asset = state
        .catalog()
        .find_by_id(id)
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;

    if !asset.is_owned_by(user_id) {
        tracing::warn!(
            media_id = id,
            owner_id = asset.owner_id,
            user_id,
            "Rejected access to media owned by another user"
        );
        return Err(ApiError::forbidden(
            "You do not have permission to access this media",
        ));
    }

    Ok(asset)
}

/// POST /api/media/upload - Upload an image or video.
///
/// Request body: multipart/form-data with a "file" part and an optional
/// "customId" field.
#[utoipa::path(
    post,
    path = "/api/media/upload",
    tag = "media",
    responses(
        (status = 201, description = "Media uploaded", body = MediaEnvelope),
        (status = 400, description = "Missing file, unsupported type or invalid customId"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage failure")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MediaEnvelope>), ApiError> {
    let form = read_form(multipart).await?;
    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let media_type = accept_file(&state, &file)?;

    if let Some(custom_id) = form.custom_id.as_deref() {
        validate_custom_id(custom_id).map_err(|e| state.api_error(e))?;
    }

    let content_type = state
        .policy
        .effective_content_type(file.content_type.as_deref(), &file.filename);
    let extension = extension_for(&file.filename, &content_type);
    let stored_name = stored_file_name(form.custom_id.as_deref(), &extension);
    let original_name = if file.filename.is_empty() {
        stored_name.clone()
    } else {
        file.filename
    };

    let asset = state
        .catalog()
        .create(NewMedia {
            owner_id: claims.sub,
            original_name,
            stored_name,
            content: file.content,
            content_type,
            media_type,
        })
        .await
        .map_err(|e| state.api_error(e))?;

    Ok((StatusCode::CREATED, Json(asset.into())))
}

/// PATCH /api/media/rename - Rename a media asset.
#[utoipa::path(
    patch,
    path = "/api/media/rename",
    tag = "media",
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Media renamed", body = MediaEnvelope),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Media not found"),
        (status = 500, description = "Storage failure")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rename_media(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<RenameRequest>,
) -> Result<Json<MediaEnvelope>, ApiError> {
    load_owned(&state, req.media_id, claims.sub).await?;

    validate_request(&req)?;
    let new_name = validate_rename(&req.new_name).map_err(|e| state.api_error(e))?;

    let asset = state
        .catalog()
        .rename(req.media_id, &new_name)
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;

    Ok(Json(asset.into()))
}

/// PUT /api/media/replace - Replace the content of a media asset.
///
/// Request body: multipart/form-data with a "file" part and an "id" field.
/// The new file must be of the same media type as the old one.
#[utoipa::path(
    put,
    path = "/api/media/replace",
    tag = "media",
    responses(
        (status = 200, description = "Media replaced", body = MediaEnvelope),
        (status = 400, description = "Missing fields, unsupported type or type mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Media not found"),
        (status = 413, description = "File too large"),
        (status = 500, description = "Storage failure")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn replace_media(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> Result<Json<MediaEnvelope>, ApiError> {
    let form = read_form(multipart).await?;

    let id = form
        .id
        .as_deref()
        .and_then(|id| id.trim().parse::<i64>().ok())
        .ok_or_else(|| ApiError::bad_request("A valid media id is required"))?;

    let existing = load_owned(&state, id, claims.sub).await?;

    let file = form
        .file
        .ok_or_else(|| ApiError::bad_request("No file provided"))?;

    let media_type = accept_file(&state, &file)?;
    if media_type != existing.media_type {
        return Err(ApiError::bad_request(format!(
            "Replacement must be a {}, got a {}",
            existing.media_type, media_type
        )));
    }

    let content_type = state
        .policy
        .effective_content_type(file.content_type.as_deref(), &file.filename);

    let asset = state
        .catalog()
        .replace(
            id,
            Replacement {
                filename: file.filename,
                content: file.content,
                content_type,
            },
        )
        .await
        .map_err(|e| state.api_error(e))?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;

    Ok(Json(asset.into()))
}

/// DELETE /api/media/delete?id=<id> - Delete a media asset.
#[utoipa::path(
    delete,
    path = "/api/media/delete",
    tag = "media",
    params(DeleteQuery),
    responses(
        (status = 200, description = "Media deleted", body = DeleteResponse),
        (status = 400, description = "Missing or invalid id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Media not found"),
        (status = 500, description = "Storage failure")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = query
        .media_id()
        .ok_or_else(|| ApiError::bad_request("A valid media id is required"))?;

    load_owned(&state, id, claims.sub).await?;

    let deleted = state
        .catalog()
        .delete(id)
        .await
        .map_err(|e| state.api_error(e))?;
    if !deleted {
        return Err(ApiError::not_found("Media not found"));
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Media deleted successfully".to_string(),
    }))
}

/// GET /api/media/{id} - Get a media asset.
#[utoipa::path(
    get,
    path = "/api/media/{id}",
    tag = "media",
    params(
        ("id" = i64, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Media details", body = MediaEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Media not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MediaEnvelope>, ApiError> {
    let asset = load_owned(&state, id, claims.sub).await?;
    Ok(Json(asset.into()))
}

/// GET /api/media - List the caller's media, newest first.
#[utoipa::path(
    get,
    path = "/api/media",
    tag = "media",
    params(MediaListQuery),
    responses(
        (status = 200, description = "Page of media", body = Vec<MediaResponse>),
        (status = 400, description = "Unknown media type"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<PaginatedResponse<MediaResponse>>, ApiError> {
    let media_type = query
        .media_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::parse::<MediaType>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let (page, per_page) = query.normalized();
    let (offset, limit) = query.to_offset_limit();

    let result = state
        .catalog()
        .list_by_owner(claims.sub, media_type, Pagination::new(offset, limit))
        .await
        .map_err(|e| state.api_error(e))?;

    let items = result.items.into_iter().map(MediaResponse::from).collect();

    Ok(Json(PaginatedResponse::new(
        items,
        page,
        per_page,
        result.total as u64,
    )))
}
