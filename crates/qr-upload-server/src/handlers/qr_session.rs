//! QR upload session handlers
//!
//! Primary device: `create_session`, then `poll_session` until the status is
//! `uploaded`, then `consume_session`. Secondary device (after scanning):
//! `upload_target`, then `complete_upload`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use qr_session_store::{SessionKind, SessionStatus, UploadSession};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use validator::Validate;

use crate::state::AppState;
use crate::utils::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: i64,
    pub kind: SessionKind,
    /// Falls back to the configured default TTL
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub kind: SessionKind,
    pub expires_at: DateTime<Utc>,
    /// Path the secondary device posts the image to
    pub upload_path: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteUploadRequest {
    pub kind: SessionKind,

    #[validate(url(message = "Invalid image URL"))]
    #[validate(length(max = 2048, message = "Image URL too long"))]
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: i64,
}

/// What the secondary device needs to know before uploading
#[derive(Debug, Serialize)]
pub struct UploadTargetResponse {
    pub session_id: String,
    pub kind: SessionKind,
    pub expires_at: DateTime<Utc>,
    pub remaining_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub user_id: i64,
    pub kind: SessionKind,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub remaining_seconds: i64,
}

impl SessionView {
    fn from_session(session: UploadSession, now: DateTime<Utc>) -> Self {
        Self {
            remaining_seconds: session.remaining_secs(now),
            status: session.status_at(now),
            session_id: session.id.into_inner(),
            user_id: session.user_id,
            kind: session.kind,
            uploaded_image_url: session.uploaded_image_url,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

/// POST /api/qr-sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ApiError> {
    let registry = &state.registry;
    let ttl = payload
        .ttl_seconds
        .map(Duration::from_secs)
        .unwrap_or(registry.config().default_ttl);

    let id = registry.create(payload.user_id, payload.kind, ttl)?;
    let session = registry.get(id.as_str()).ok_or_else(|| {
        ApiError::InternalError(format!("upload session {} vanished after creation", id))
    })?;

    info!(
        "Created {} upload session {} for user {} (ttl {}s)",
        session.kind,
        session.id,
        session.user_id,
        ttl.as_secs()
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            upload_path: format!("/api/qr-sessions/{}/upload", session.id),
            session_id: session.id.into_inner(),
            kind: session.kind,
            expires_at: session.expires_at,
        }),
    ))
}

/// GET /api/qr-sessions/{id}/upload-target
pub async fn upload_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UploadTargetResponse>, ApiError> {
    let registry = &state.registry;
    let session = live_session(&state, &id)?;

    if session.is_uploaded() {
        return Err(ApiError::Conflict(format!(
            "upload session {} already has an image",
            id
        )));
    }

    Ok(Json(UploadTargetResponse {
        remaining_seconds: session.remaining_secs(registry.now()),
        session_id: session.id.into_inner(),
        kind: session.kind,
        expires_at: session.expires_at,
    }))
}

/// POST /api/qr-sessions/{id}/upload
pub async fn complete_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CompleteUploadRequest>,
) -> Result<Json<SessionView>, ApiError> {
    validate_upload(&payload, &state.settings.upload.allowed_url_schemes)?;

    let session = live_session(&state, &id)?;
    if session.kind != payload.kind {
        return Err(ApiError::BadRequest(format!(
            "upload session {} expects a {} image, got {}",
            id, session.kind, payload.kind
        )));
    }

    let updated = state.registry.mark_uploaded(&id, payload.image_url)?;
    info!(
        "Upload session {} completed for user {}",
        updated.id, updated.user_id
    );

    Ok(Json(SessionView::from_session(updated, state.registry.now())))
}

/// GET /api/qr-sessions/{id}?user_id=
pub async fn poll_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<SessionView>, ApiError> {
    let session = owned_session(&state, &id, owner.user_id)?;
    debug!("Polled upload session {} ({})", id, session.status.as_str());

    Ok(Json(SessionView::from_session(session, state.registry.now())))
}

/// DELETE /api/qr-sessions/{id}?user_id=
pub async fn consume_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<SessionView>, ApiError> {
    owned_session(&state, &id, owner.user_id)?;

    let session = state
        .registry
        .take(&id)
        .ok_or_else(|| ApiError::NotFound(format!("upload session {} not found or expired", id)))?;
    info!("Consumed upload session {} for user {}", id, session.user_id);

    Ok(Json(SessionView::from_session(session, state.registry.now())))
}

fn live_session(state: &AppState, id: &str) -> Result<UploadSession, ApiError> {
    state
        .registry
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("upload session {} not found or expired", id)))
}

fn owned_session(state: &AppState, id: &str, user_id: i64) -> Result<UploadSession, ApiError> {
    let session = live_session(state, id)?;
    if session.user_id != user_id {
        return Err(ApiError::Forbidden(format!(
            "upload session {} belongs to another user",
            id
        )));
    }
    Ok(session)
}

fn validate_upload(
    payload: &CompleteUploadRequest,
    allowed_schemes: &[String],
) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload payload: {}", e)))?;

    let url = Url::parse(&payload.image_url)
        .map_err(|e| ApiError::BadRequest(format!("Invalid image URL: {}", e)))?;

    if !matches!(url.host_str(), Some(host) if !host.is_empty()) {
        return Err(ApiError::BadRequest("image_url has no host".to_string()));
    }
    if !allowed_schemes
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(url.scheme()))
    {
        return Err(ApiError::BadRequest(format!(
            "image_url scheme '{}' is not allowed",
            url.scheme()
        )));
    }
    Ok(())
}
