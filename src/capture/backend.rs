use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested from a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

impl CaptureCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureCommand::Start => "start",
            CaptureCommand::Pause => "pause",
            CaptureCommand::Resume => "resume",
            CaptureCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for CaptureCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio capture device driven by a recording session
///
/// The device itself lives outside this crate:
/// - NATS: a capture service answering control requests
/// - Log: development stand-in that only logs
///
/// Every call may fail; a failed call leaves the session in its prior state.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Begin capturing audio
    async fn start(&mut self) -> Result<()>;

    /// Suspend capture without releasing the device
    async fn pause(&mut self) -> Result<()>;

    /// Continue a paused capture
    async fn resume(&mut self) -> Result<()>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Dispatch `command` to the matching device operation.
pub async fn invoke(device: &mut dyn CaptureDevice, command: CaptureCommand) -> Result<()> {
    match command {
        CaptureCommand::Start => device.start().await,
        CaptureCommand::Pause => device.pause().await,
        CaptureCommand::Resume => device.resume().await,
        CaptureCommand::Stop => device.stop().await,
    }
}

/// Creates one capture device per mounted meeting
pub trait CaptureFactory: Send + Sync {
    fn create(&self, meeting_id: &str) -> Result<Box<dyn CaptureDevice>>;
}
