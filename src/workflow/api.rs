use anyhow::Result;
use chrono::{DateTime, Utc};

/// Produces meeting minutes once recording has finished
#[async_trait::async_trait]
pub trait MinutesGenerator: Send + Sync {
    /// Generate minutes for `meeting_id`; returns the minutes text
    ///
    /// Failures are classified by their message (rate limit, payment, other).
    async fn generate(&self, meeting_id: &str, elapsed_seconds: u64) -> Result<String>;
}

/// Records meeting lifecycle changes outside this crate
#[async_trait::async_trait]
pub trait MeetingStatusUpdater: Send + Sync {
    /// Mark the meeting completed at `ended_at`
    async fn mark_completed(&self, meeting_id: &str, ended_at: DateTime<Utc>) -> Result<()>;
}
