use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // View lifecycle
        .route("/meetings/:meeting_id/mount", post(handlers::mount_meeting))
        .route("/meetings/:meeting_id", delete(handlers::unmount_meeting))
        // Recording control
        .route(
            "/meetings/:meeting_id/record/:action",
            post(handlers::record_action),
        )
        // Meeting queries
        .route(
            "/meetings/:meeting_id/status",
            get(handlers::get_meeting_status),
        )
        .route(
            "/meetings/:meeting_id/notices",
            get(handlers::drain_notices),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
