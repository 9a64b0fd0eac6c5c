//! REST API handlers for the wizard pipeline and operational endpoints.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use forge_core::types::{CreativeDisplay, FontSize, SizePreset};
use forge_core::ForgeError;
use forge_pipeline::WizardSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::sessions::{Session, SessionStore};

/// Maximum accepted URL length at the API boundary.
const MAX_URL_LEN: usize = 2048;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub start_time: Instant,
}

// ─── Request / response bodies ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ScanRequest {
    pub website_url: String,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct SizeRequest {
    pub preset: SizePreset,
}

#[derive(Deserialize)]
pub struct DisplayPatch {
    pub show_headline: Option<bool>,
    pub font_size: Option<FontSize>,
    pub text_color: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub snapshot: WizardSnapshot,
    pub displays: HashMap<Uuid, CreativeDisplay>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub uptime_secs: u64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

fn session_response(session: &Session, snapshot: WizardSnapshot) -> SessionResponse {
    session.reconcile_displays(&snapshot);
    let displays = session
        .displays
        .iter()
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect();
    SessionResponse {
        session_id: session.id,
        snapshot,
        displays,
    }
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not_found".to_string(),
            message: format!("{what} not found"),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    metrics::counter!("api.validation_errors").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "invalid_request".to_string(),
            message: message.into(),
        }),
    )
}

/// Convert a pipeline failure into a stage-scoped HTTP error. Generation
/// failures are the backend's fault, not the client's, and map to 502.
fn stage_error(e: ForgeError) -> ApiError {
    let (status, code) = match &e {
        ForgeError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        ForgeError::BrandProfile(_) => (StatusCode::BAD_GATEWAY, "brand_profile_failed"),
        ForgeError::CampaignIdeation(_) => (StatusCode::BAD_GATEWAY, "campaign_ideation_failed"),
        ForgeError::CreativeRender(_) => (StatusCode::BAD_GATEWAY, "creative_render_failed"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    if status == StatusCode::BAD_GATEWAY {
        error!(stage = e.stage(), error = %e, "generation stage failed");
        metrics::counter!("api.stage_failures", "stage" => e.stage()).increment(1);
    } else {
        warn!(error = %e, "request rejected");
        metrics::counter!("api.validation_errors").increment(1);
    }

    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: e.to_string(),
        }),
    )
}

fn session_or_404(state: &AppState, id: &Uuid) -> ApiResult<Arc<Session>> {
    state.store.get(id).ok_or_else(|| not_found("session"))
}

// ─── Session lifecycle ──────────────────────────────────────────────────────

/// POST /v1/sessions — create a new wizard session.
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.store.create();
    let snapshot = session.wizard.snapshot();
    (
        StatusCode::CREATED,
        Json(session_response(&session, snapshot)),
    )
}

/// GET /v1/sessions/{id} — current session snapshot.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.snapshot();
    Ok(Json(session_response(&session, snapshot)))
}

/// DELETE /v1/sessions/{id} — discard a session entirely.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("session"))
    }
}

// ─── Wizard operations ──────────────────────────────────────────────────────

/// POST /v1/sessions/{id}/scan — derive the brand identity from a URL.
pub async fn scan_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<Json<SessionResponse>> {
    // Boundary validation: the pipeline treats the URL as opaque, so the
    // emptiness and length checks live here.
    let url = request.website_url.trim();
    if url.is_empty() {
        return Err(bad_request("'website_url' must not be empty"));
    }
    if url.len() > MAX_URL_LEN {
        return Err(bad_request("'website_url' exceeds maximum length"));
    }

    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.scan(url).await.map_err(stage_error)?;
    Ok(Json(session_response(&session, snapshot)))
}

/// POST /v1/sessions/{id}/ideas — generate or regenerate the idea batch.
pub async fn generate_ideas(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.generate_ideas().await.map_err(stage_error)?;
    Ok(Json(session_response(&session, snapshot)))
}

/// POST /v1/sessions/{id}/select — choose a campaign idea and render the
/// initial creative batch.
pub async fn select_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session
        .wizard
        .select_campaign(request.index)
        .await
        .map_err(stage_error)?;
    Ok(Json(session_response(&session, snapshot)))
}

/// PUT /v1/sessions/{id}/creatives/size — destructive full-batch replace
/// at a new size preset.
pub async fn change_size(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SizeRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session
        .wizard
        .change_size(request.preset)
        .await
        .map_err(stage_error)?;
    Ok(Json(session_response(&session, snapshot)))
}

/// POST /v1/sessions/{id}/creatives — append one creative.
pub async fn add_creative(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.add_creative().await.map_err(stage_error)?;
    Ok(Json(session_response(&session, snapshot)))
}

/// POST /v1/sessions/{id}/restart — discard all session entities and
/// return to the first step.
pub async fn restart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.restart();
    Ok(Json(session_response(&session, snapshot)))
}

// ─── Creative view state and export ─────────────────────────────────────────

/// PATCH /v1/sessions/{id}/creatives/{creative_id}/display — update the
/// display overlay for one creative. Only the provided fields change.
pub async fn patch_display(
    State(state): State<AppState>,
    Path((id, creative_id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<DisplayPatch>,
) -> ApiResult<Json<CreativeDisplay>> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.snapshot();
    if !snapshot.creatives.iter().any(|c| c.id == creative_id) {
        return Err(not_found("creative"));
    }
    session.reconcile_displays(&snapshot);

    let mut display = session
        .displays
        .get_mut(&creative_id)
        .ok_or_else(|| not_found("creative"))?;
    if let Some(show_headline) = patch.show_headline {
        display.show_headline = show_headline;
    }
    if let Some(font_size) = patch.font_size {
        display.font_size = font_size;
    }
    if let Some(text_color) = patch.text_color {
        display.text_color = text_color;
    }
    Ok(Json(display.clone()))
}

/// GET /v1/sessions/{id}/creatives/{creative_id}/download — the creative's
/// image bytes. Embedded references are decoded and served directly;
/// external references redirect.
pub async fn download_creative(
    State(state): State<AppState>,
    Path((id, creative_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Response> {
    let session = session_or_404(&state, &id)?;
    let snapshot = session.wizard.snapshot();
    let creative = snapshot
        .creatives
        .iter()
        .find(|c| c.id == creative_id)
        .ok_or_else(|| not_found("creative"))?;

    match creative.image_url.decode_embedded() {
        Some((mime_type, bytes)) => {
            let extension = match mime_type.as_str() {
                "image/png" => "png",
                _ => "jpg",
            };
            let disposition =
                format!("attachment; filename=\"creative-{creative_id}.{extension}\"");
            Ok((
                [
                    (header::CONTENT_TYPE, mime_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        None => Ok(Redirect::temporary(creative.image_url.as_str()).into_response()),
    }
}

// ─── Operational endpoints ──────────────────────────────────────────────────

/// GET /health — health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        sessions: state.store.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — readiness probe.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
