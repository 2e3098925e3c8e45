use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one mounted meeting view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Meeting identifier (e.g., "meeting-2025-10-28-standup")
    pub meeting_id: String,

    /// User viewing the meeting
    pub user_id: String,

    /// Host (creator) of the meeting; the only user allowed to restore capture
    pub host_id: String,

    /// How often the display clock is refreshed
    /// Default: 1 second
    pub tick_interval: Duration,
}

impl SessionConfig {
    pub fn new(
        meeting_id: impl Into<String>,
        user_id: impl Into<String>,
        host_id: impl Into<String>,
    ) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            user_id: user_id.into(),
            host_id: host_id.into(),
            ..Self::default()
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Whether the viewing user is the meeting's host
    pub fn is_host(&self) -> bool {
        !self.user_id.is_empty() && self.user_id == self.host_id
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            meeting_id: format!("meeting-{}", uuid::Uuid::new_v4()),
            user_id: String::new(),
            host_id: String::new(),
            tick_interval: Duration::from_secs(1),
        }
    }
}
