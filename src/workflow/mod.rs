//! Post-stop minutes workflow
//!
//! - `api`: minutes generator and meeting status collaborators
//! - `trigger`: fires the workflow once per owned stop
//! - `outcome`: failure classification and user guidance
//! - `http`: REST client for the meeting backend

mod api;
mod http;
mod outcome;
mod trigger;

pub use api::{MeetingStatusUpdater, MinutesGenerator};
pub use http::{ApiStatusError, HttpMeetingApi};
pub use outcome::GenerationOutcome;
pub use trigger::{InFlightGuard, InFlightRegistry, PostStopWorkflowTrigger};
