//! User-facing notifications.
//!
//! Every failure in the engine ends up as exactly one [`Notice`]; nothing
//! propagates further.

use crate::capture::CaptureCommand;
use crate::workflow::GenerationOutcome;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A capture operation failed; the session kept its previous state.
    CaptureFailed {
        meeting_id: String,
        command: CaptureCommand,
        error: String,
    },
    /// Restoration kept the timer but could not restart capture.
    CaptureNotResumed { meeting_id: String, error: String },
    /// Minutes were generated; open the viewer.
    MinutesReady { meeting_id: String, minutes: String },
    /// Minutes generation failed.
    MinutesFailed {
        meeting_id: String,
        outcome: GenerationOutcome,
    },
}

impl Notice {
    pub fn meeting_id(&self) -> &str {
        match self {
            Notice::CaptureFailed { meeting_id, .. }
            | Notice::CaptureNotResumed { meeting_id, .. }
            | Notice::MinutesReady { meeting_id, .. }
            | Notice::MinutesFailed { meeting_id, .. } => meeting_id,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::CaptureFailed { command, error, .. } => {
                format!("Could not {} the recording: {}. Please try again.", command, error)
            }
            Notice::CaptureNotResumed { error, .. } => format!(
                "The recording timer was restored, but audio capture could not resume: {}. Retry capture to continue recording.",
                error
            ),
            Notice::MinutesReady { .. } => "Meeting minutes are ready.".to_string(),
            Notice::MinutesFailed { outcome, .. } => outcome.guidance(),
        }
    }

    fn is_failure(&self) -> bool {
        !matches!(self, Notice::MinutesReady { .. })
    }
}

/// Receives user-facing notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

fn log_notice(notice: &Notice) {
    if notice.is_failure() {
        warn!("[{}] {}", notice.meeting_id(), notice.message());
    } else {
        info!("[{}] {}", notice.meeting_id(), notice.message());
    }
}

/// Forwards notices to a channel
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
        let _ = self.tx.send(notice);
    }
}

/// Holds pending notices per meeting until a client drains them
#[derive(Clone, Default)]
pub struct NoticeBoard {
    pending: Arc<Mutex<HashMap<String, Vec<Notice>>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Notice>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Take every pending notice for `meeting_id`
    pub fn drain(&self, meeting_id: &str) -> Vec<Notice> {
        self.lock().remove(meeting_id).unwrap_or_default()
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
        self.lock()
            .entry(notice.meeting_id().to_string())
            .or_default()
            .push(notice);
    }
}
