use super::model::RecordingState;
use crate::clock::Millis;
use serde::Serialize;

/// Where a state change originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    /// User action in this tab
    Local,
    /// Re-attachment after a reload or remount
    Restored,
    /// Adopted from another tab's write
    Remote,
}

/// A state change observed by a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub meeting_id: String,
    pub from: RecordingState,
    pub to: RecordingState,
    pub source: TransitionSource,
    /// Whether this tab owned the capture device when the change happened
    pub owned: bool,
    /// Elapsed seconds at the transition instant (the final value for a stop)
    pub elapsed_seconds: u64,
    pub at: Millis,
}
