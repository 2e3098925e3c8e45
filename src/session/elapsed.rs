//! Pause-aware elapsed time.
//!
//! Elapsed time is always derived from the session timestamps, never from
//! counting display ticks, so a ticker that was throttled or skipped for a
//! while still reports the right value on its next run.

use super::model::{RecordingSession, RecordingState};
use crate::clock::Millis;

/// Elapsed recording time in milliseconds at `now`.
///
/// Frozen at the pause instant while paused, zero for idle or stopped
/// sessions, never negative.
pub fn elapsed_ms(session: &RecordingSession, now: Millis) -> i64 {
    let Some(started_at) = session.started_at else {
        return 0;
    };

    let until = match session.state {
        RecordingState::Recording => now,
        RecordingState::Paused => session.pause_started_at.unwrap_or(now),
        RecordingState::Idle | RecordingState::Stopped => return 0,
    };

    until
        .saturating_sub(started_at)
        .saturating_sub(session.accumulated_pause_ms)
        .max(0)
}

/// Elapsed recording time in whole seconds at `now`.
pub fn elapsed_seconds(session: &RecordingSession, now: Millis) -> u64 {
    (elapsed_ms(session, now) / 1000) as u64
}

/// Render seconds as `MM:SS`, or `H:MM:SS` past the hour.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
