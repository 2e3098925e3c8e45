//! HTTP API for driving recording sessions from a meeting UI
//!
//! This module provides a REST API over mounted meeting views:
//! - POST /meetings/:id/mount - Mount a view (runs restoration)
//! - DELETE /meetings/:id - Unmount a view
//! - POST /meetings/:id/record/:action - start, pause, resume, stop, retry-capture
//! - GET /meetings/:id/status - State and elapsed time
//! - GET /meetings/:id/notices - Drain user notices
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, MountReservation};
