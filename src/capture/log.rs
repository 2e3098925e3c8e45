use super::backend::{CaptureDevice, CaptureFactory};
use anyhow::Result;
use tracing::info;

/// Capture device that records nothing and only logs the requested operations.
pub struct LogCaptureDevice {
    meeting_id: String,
    capturing: bool,
}

impl LogCaptureDevice {
    pub fn new(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            capturing: false,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }
}

#[async_trait::async_trait]
impl CaptureDevice for LogCaptureDevice {
    async fn start(&mut self) -> Result<()> {
        info!("[log capture] start for meeting {}", self.meeting_id);
        self.capturing = true;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        info!("[log capture] pause for meeting {}", self.meeting_id);
        self.capturing = false;
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        info!("[log capture] resume for meeting {}", self.meeting_id);
        self.capturing = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        info!("[log capture] stop for meeting {}", self.meeting_id);
        self.capturing = false;
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogCaptureFactory;

impl CaptureFactory for LogCaptureFactory {
    fn create(&self, meeting_id: &str) -> Result<Box<dyn CaptureDevice>> {
        Ok(Box::new(LogCaptureDevice::new(meeting_id)))
    }
}
