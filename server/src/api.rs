//! HTTP surface for the scheduler.
//!
//! Mutating routes and the playlist listing are gated by the station's
//! broadcast key, passed as `?token=` or `Authorization: Bearer`. The live
//! and schedule routes are public.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use roundcast::app_core::{AddOutcome, SchedulerService};
use roundcast::engine::PlaylistSnapshot;
use roundcast::now_playing::LiveState;
use roundcast::overrides::parse_time;
use roundcast::scheduler::PlayEvent;
use roundcast::track::{NewTrack, Track};
use roundcast::SchedulerError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SchedulerService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .route(
                    "/playlist",
                    get(get_playlist).post(add_track).delete(remove_track),
                )
                .route("/playlist/order", put(reorder_playlist))
                .route(
                    "/playlist/:id/override",
                    post(set_override).delete(clear_override),
                )
                .route("/live", get(live))
                .route("/schedule", get(schedule))
                .route("/version", get(version)),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

pub struct ApiError(SchedulerError);

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SchedulerError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulerError::Unauthorized => StatusCode::FORBIDDEN,
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulerError::Config(_) | SchedulerError::Internal(_) => {
                error!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    ids: Vec<String>,
}

/// Either `{"hour": 9, "minute": 0}` or `{"time": "09:00"}`.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    hour: Option<u32>,
    minute: Option<u32>,
    time: Option<String>,
}

impl OverrideRequest {
    fn hour_minute(&self) -> Result<(u32, u32), SchedulerError> {
        match (&self.time, self.hour) {
            (Some(time), _) => parse_time(time),
            (None, Some(hour)) => Ok((hour, self.minute.unwrap_or(0))),
            (None, None) => Err(SchedulerError::validation(
                "override needs 'hour' (and optional 'minute') or 'time'",
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    added: bool,
    #[serde(flatten)]
    outcome: AddOutcome,
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    removed: bool,
    playlist: PlaylistSnapshot,
}

#[derive(Debug, Serialize)]
pub struct LiveResponse {
    #[serde(flatten)]
    state: LiveState,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    server_now: DateTime<Utc>,
    events: Vec<PlayEvent>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    version: u64,
}

fn credential(query: &TokenQuery, headers: &HeaderMap) -> Option<String> {
    query.token.clone().or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.trim().to_string())
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "roundcast-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/playlist
async fn get_playlist(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<PlaylistSnapshot> {
    let cred = credential(&query, &headers);
    Ok(Json(state.service.playlist(cred.as_deref())?))
}

/// POST /api/playlist
async fn add_track(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    Json(payload): Json<NewTrack>,
) -> ApiResult<AddResponse> {
    let cred = credential(&query, &headers);
    let outcome = state.service.add_track(cred.as_deref(), payload)?;
    Ok(Json(AddResponse {
        added: true,
        outcome,
    }))
}

/// DELETE /api/playlist
async fn remove_track(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    Json(req): Json<RemoveRequest>,
) -> ApiResult<RemoveResponse> {
    let cred = credential(&query, &headers);
    let outcome = state.service.remove_track(cred.as_deref(), &req.id)?;
    Ok(Json(RemoveResponse {
        removed: outcome.removed.is_some(),
        playlist: outcome.playlist,
    }))
}

/// PUT /api/playlist/order
async fn reorder_playlist(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<PlaylistSnapshot> {
    let cred = credential(&query, &headers);
    Ok(Json(state.service.reorder(cred.as_deref(), &req.ids)?))
}

/// POST /api/playlist/:id/override
async fn set_override(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    Json(req): Json<OverrideRequest>,
) -> ApiResult<Track> {
    let cred = credential(&query, &headers);
    state.service.authorize(cred.as_deref())?;
    let (hour, minute) = req.hour_minute()?;
    Ok(Json(
        state
            .service
            .set_override(cred.as_deref(), &id, hour, minute)?,
    ))
}

/// DELETE /api/playlist/:id/override
async fn clear_override(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<Track> {
    let cred = credential(&query, &headers);
    Ok(Json(state.service.clear_override(cred.as_deref(), &id)?))
}

/// GET /api/live
async fn live(State(state): State<AppState>) -> ApiResult<LiveResponse> {
    let live = state.service.currently_playing()?;
    let message = match live {
        LiveState::NoSongs => Some("No songs in playlist"),
        LiveState::NoSchedule => Some("No schedule"),
        LiveState::Playing(_) => None,
    };
    Ok(Json(LiveResponse {
        state: live,
        message,
    }))
}

/// GET /api/schedule
async fn schedule(State(state): State<AppState>) -> ApiResult<ScheduleResponse> {
    let now = state.service.now();
    let events = state.service.full_schedule_at(now)?;
    Ok(Json(ScheduleResponse {
        server_now: now,
        events,
    }))
}

/// GET /api/version
async fn version(State(state): State<AppState>) -> ApiResult<VersionResponse> {
    Ok(Json(VersionResponse {
        version: state.service.version()?,
    }))
}
