use super::client::NatsClient;
use crate::capture::{CaptureCommand, CaptureDevice, CaptureFactory};
use anyhow::Result;

/// Capture device living in a separate service, controlled over NATS request/reply
pub struct NatsCaptureDevice {
    client: NatsClient,
    meeting_id: String,
    tab_id: String,
}

impl NatsCaptureDevice {
    pub fn new(client: NatsClient, meeting_id: impl Into<String>, tab_id: impl Into<String>) -> Self {
        Self {
            client,
            meeting_id: meeting_id.into(),
            tab_id: tab_id.into(),
        }
    }

    async fn send(&self, command: CaptureCommand) -> Result<()> {
        self.client
            .request_capture(&self.meeting_id, &self.tab_id, command)
            .await
    }
}

#[async_trait::async_trait]
impl CaptureDevice for NatsCaptureDevice {
    async fn start(&mut self) -> Result<()> {
        self.send(CaptureCommand::Start).await
    }

    async fn pause(&mut self) -> Result<()> {
        self.send(CaptureCommand::Pause).await
    }

    async fn resume(&mut self) -> Result<()> {
        self.send(CaptureCommand::Resume).await
    }

    async fn stop(&mut self) -> Result<()> {
        self.send(CaptureCommand::Stop).await
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Creates NATS capture devices that share one connection
pub struct NatsCaptureFactory {
    client: NatsClient,
    tab_id: String,
}

impl NatsCaptureFactory {
    pub fn new(client: NatsClient, tab_id: impl Into<String>) -> Self {
        Self {
            client,
            tab_id: tab_id.into(),
        }
    }
}

impl CaptureFactory for NatsCaptureFactory {
    fn create(&self, meeting_id: &str) -> Result<Box<dyn CaptureDevice>> {
        Ok(Box::new(NatsCaptureDevice::new(
            self.client.clone(),
            meeting_id,
            self.tab_id.clone(),
        )))
    }
}
