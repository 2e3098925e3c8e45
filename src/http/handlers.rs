use super::state::AppState;
use crate::error::SessionError;
use crate::notice::Notice;
use crate::session::{RestoreOutcome, SessionConfig, SessionStatus};
use crate::view::MeetingView;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MountRequest {
    /// User opening the meeting
    pub user_id: String,

    /// Host (creator) of the meeting
    pub host_id: String,
}

#[derive(Debug, Serialize)]
pub struct MountResponse {
    pub meeting_id: String,
    pub restore: RestoreOutcome,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
pub struct NoticeResponse {
    pub message: String,
    #[serde(flatten)]
    pub notice: Notice,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn not_mounted(meeting_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Meeting {} is not mounted", meeting_id),
    )
}

fn session_error(e: SessionError) -> Response {
    let status = match &e {
        SessionError::InvalidTransition { .. } | SessionError::CaptureAttached { .. } => {
            StatusCode::CONFLICT
        }
        SessionError::NotOwner { .. } => StatusCode::FORBIDDEN,
        SessionError::Capture { .. } => StatusCode::BAD_GATEWAY,
    };
    error_response(status, e.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /meetings/:meeting_id/mount
/// Mount a meeting view; restores an active session when possible
pub async fn mount_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    Json(req): Json<MountRequest>,
) -> Response {
    let Some(reservation) = state.reserve_mount(&meeting_id).await else {
        return error_response(
            StatusCode::CONFLICT,
            format!("Meeting {} is already mounted", meeting_id),
        );
    };

    let config = SessionConfig::new(meeting_id.clone(), req.user_id, req.host_id)
        .with_tick_interval(state.tick_interval);

    let view = match MeetingView::mount(config, &state.deps).await {
        Ok(view) => Arc::new(view),
        Err(e) => {
            error!("Failed to mount meeting {}: {:#}", meeting_id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to mount meeting: {:#}", e),
            );
        }
    };

    let response = MountResponse {
        meeting_id: meeting_id.clone(),
        restore: view.restore_outcome().clone(),
        status: view.controller().status().await,
    };

    {
        let mut views = state.views.write().await;
        views.insert(meeting_id, view);
    }
    drop(reservation);

    (StatusCode::OK, Json(response)).into_response()
}

/// DELETE /meetings/:meeting_id
/// Unmount a meeting view (stops listening, keeps the persisted session)
pub async fn unmount_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Response {
    let view = {
        let mut views = state.views.write().await;
        views.remove(&meeting_id)
    };

    match view {
        Some(_) => {
            info!("Unmounted meeting {}", meeting_id);
            StatusCode::NO_CONTENT.into_response()
        }
        None => not_mounted(&meeting_id),
    }
}

/// POST /meetings/:meeting_id/record/:action
/// Drive the recording: start, pause, resume, stop or retry-capture
pub async fn record_action(
    State(state): State<AppState>,
    Path((meeting_id, action)): Path<(String, String)>,
) -> Response {
    let Some(view) = state.view(&meeting_id).await else {
        return not_mounted(&meeting_id);
    };
    let controller = view.controller();

    let result = match action.as_str() {
        "start" => controller.start().await.map(|_| ()),
        "pause" => controller.pause().await.map(|_| ()),
        "resume" => controller.resume().await.map(|_| ()),
        "stop" => controller.stop().await.map(|_| ()),
        "retry-capture" => controller.retry_capture().await,
        other => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Unknown recording action: {}", other),
            )
        }
    };

    match result {
        Ok(()) => (StatusCode::OK, Json(controller.status().await)).into_response(),
        Err(e) => {
            error!("{} failed for meeting {}: {}", action, meeting_id, e);
            session_error(e)
        }
    }
}

/// GET /meetings/:meeting_id/status
/// Current state and elapsed time of a mounted meeting
pub async fn get_meeting_status(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Response {
    match state.view(&meeting_id).await {
        Some(view) => (StatusCode::OK, Json(view.controller().status().await)).into_response(),
        None => not_mounted(&meeting_id),
    }
}

/// GET /meetings/:meeting_id/notices
/// Drain pending user notices for a meeting
pub async fn drain_notices(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> impl IntoResponse {
    let notices: Vec<NoticeResponse> = state
        .notices
        .drain(&meeting_id)
        .into_iter()
        .map(|notice| NoticeResponse {
            message: notice.message(),
            notice,
        })
        .collect();

    (StatusCode::OK, Json(notices))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
