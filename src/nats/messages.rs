use crate::capture::CaptureCommand;
use serde::{Deserialize, Serialize};

/// Capture control request sent to the capture service
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureCommandMessage {
    pub meeting_id: String,
    pub command: CaptureCommand,
    pub tab_id: String,  // Tab that owns the capture device
    pub timestamp: String,  // RFC3339 timestamp
}

/// Reply from the capture service
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureReplyMessage {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
