use crate::clock::Millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl RecordingState {
    /// Whether a capture session is in progress (recording or paused)
    pub fn is_active(self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Paused)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
            RecordingState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory view of one meeting's recording session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSession {
    /// Meeting this session belongs to
    pub meeting_id: String,

    /// Current lifecycle state
    pub state: RecordingState,

    /// When recording first began; untouched by pause/resume
    pub started_at: Option<Millis>,

    /// Sum of all completed pauses
    pub accumulated_pause_ms: i64,

    /// Start of the pause in progress, if paused
    pub pause_started_at: Option<Millis>,

    /// Timestamp of the most recent persisted update
    pub last_write_at: Millis,
}

impl RecordingSession {
    pub fn idle(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            state: RecordingState::Idle,
            started_at: None,
            accumulated_pause_ms: 0,
            pause_started_at: None,
            last_write_at: 0,
        }
    }

    pub(crate) fn begin(&mut self, now: Millis) {
        self.state = RecordingState::Recording;
        self.started_at = Some(now);
        self.accumulated_pause_ms = 0;
        self.pause_started_at = None;
    }

    pub(crate) fn pause(&mut self, now: Millis) {
        self.state = RecordingState::Paused;
        self.pause_started_at = Some(now);
    }

    pub(crate) fn resume(&mut self, now: Millis) {
        if let Some(paused_at) = self.pause_started_at.take() {
            self.accumulated_pause_ms = self
                .accumulated_pause_ms
                .saturating_add(now.saturating_sub(paused_at).max(0));
        }
        self.state = RecordingState::Recording;
    }

    pub(crate) fn finish(&mut self) {
        self.state = RecordingState::Stopped;
        self.started_at = None;
        self.accumulated_pause_ms = 0;
        self.pause_started_at = None;
    }

    /// Take over state and timing from another view of the same session.
    pub(crate) fn adopt(&mut self, other: &RecordingSession) {
        self.state = other.state;
        self.started_at = other.started_at;
        self.accumulated_pause_ms = other.accumulated_pause_ms;
        self.pause_started_at = other.pause_started_at;
        self.last_write_at = other.last_write_at;
    }
}
