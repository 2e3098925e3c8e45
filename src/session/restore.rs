use super::config::SessionConfig;
use super::controller::RecordingSessionController;
use super::model::RecordingState;
use super::transition::TransitionSource;
use crate::notice::Notice;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// What happened when a mounted view looked for an active session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// Restoration already ran for this mount
    AlreadyAttempted,
    /// No active session is persisted for the meeting
    NothingToRestore,
    /// This tab already holds a session
    AlreadyActive,
    /// The viewer is not the host; the session is mirrored for display only
    Observing { elapsed_seconds: u64 },
    /// Capture restarted; this tab now owns the session
    Restored { elapsed_seconds: u64 },
    /// Timer restored but capture could not restart
    CaptureFailed { elapsed_seconds: u64, error: String },
}

/// Re-attaches a mounted view to a session that survived a reload
#[derive(Debug, Default)]
pub struct SessionRestorer {
    attempted: AtomicBool,
}

impl SessionRestorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run restoration for this mount. Only the first call does anything.
    pub async fn restore(
        &self,
        controller: &RecordingSessionController,
        config: &SessionConfig,
    ) -> RestoreOutcome {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return RestoreOutcome::AlreadyAttempted;
        }

        let meeting_id = controller.meeting_id();
        let Some(record) = controller
            .store()
            .read(meeting_id)
            .await
            .filter(|record| record.is_active())
        else {
            return RestoreOutcome::NothingToRestore;
        };

        if controller.snapshot().await.state != RecordingState::Idle {
            return RestoreOutcome::AlreadyActive;
        }

        if !config.is_host() {
            controller.adopt_record(&record, TransitionSource::Remote).await;
            let elapsed_seconds = controller.elapsed_seconds().await;
            info!(
                "Meeting {} is being recorded by its host, mirroring at {}s",
                meeting_id, elapsed_seconds
            );
            return RestoreOutcome::Observing { elapsed_seconds };
        }

        controller
            .adopt_record(&record, TransitionSource::Restored)
            .await;
        let elapsed_seconds = controller.elapsed_seconds().await;
        info!(
            "Restoring {} session for meeting {} at {}s",
            record.state, meeting_id, elapsed_seconds
        );

        match controller.reattach().await {
            Ok(()) => RestoreOutcome::Restored { elapsed_seconds },
            Err(e) => {
                warn!("Restored timer for meeting {} without capture: {}", meeting_id, e);
                let error = e.to_string();
                controller.notify(Notice::CaptureNotResumed {
                    meeting_id: meeting_id.to_string(),
                    error: error.clone(),
                });
                RestoreOutcome::CaptureFailed {
                    elapsed_seconds,
                    error,
                }
            }
        }
    }
}
