//! Recording session management
//!
//! This module provides the per-tab recording session engine:
//! - Pause-aware elapsed time derived from timestamps
//! - The recording state machine driving the capture device
//! - Cross-tab reconciliation through the shared store
//! - Restoration of an active session after a reload

mod config;
mod controller;
pub mod elapsed;
mod model;
mod restore;
mod sync;
mod transition;

pub use config::SessionConfig;
pub use controller::{RecordingSessionController, SessionStatus};
pub use elapsed::{elapsed_ms, elapsed_seconds, format_elapsed};
pub use model::{RecordingSession, RecordingState};
pub use restore::{RestoreOutcome, SessionRestorer};
pub use sync::CrossTabSynchronizer;
pub use transition::{Transition, TransitionSource};
