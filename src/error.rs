use crate::capture::CaptureCommand;
use crate::session::RecordingState;
use thiserror::Error;

/// Why a recording session operation was refused
#[derive(Error, Debug)]
pub enum SessionError {
    /// The requested operation does not apply to the current state.
    #[error("cannot {command} a session that is {from}")]
    InvalidTransition {
        command: CaptureCommand,
        from: RecordingState,
    },

    /// Another tab drives the capture device for this session.
    #[error("meeting {meeting_id} is being recorded from another tab")]
    NotOwner { meeting_id: String },

    /// Capture is already attached; nothing to retry.
    #[error("capture for meeting {meeting_id} is already running")]
    CaptureAttached { meeting_id: String },

    /// The capture device rejected the operation; prior state retained.
    #[error("capture device failed to {command}: {source:#}")]
    Capture {
        command: CaptureCommand,
        source: anyhow::Error,
    },
}
