use super::messages::{CaptureCommandMessage, CaptureReplyMessage};
use crate::capture::CaptureCommand;
use anyhow::{Context, Result};
use async_nats::Client;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    subject_prefix: String,
    timeout: Duration,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject_prefix: &str, timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.to_string(),
            timeout,
        })
    }

    /// Subject the capture service listens on for `meeting_id`
    pub fn capture_subject(&self, meeting_id: &str) -> String {
        format!("{}.{}", self.subject_prefix, meeting_id)
    }

    /// Send a capture command and wait for the service to acknowledge it
    pub async fn request_capture(
        &self,
        meeting_id: &str,
        tab_id: &str,
        command: CaptureCommand,
    ) -> Result<()> {
        let subject = self.capture_subject(meeting_id);

        let message = CaptureCommandMessage {
            meeting_id: meeting_id.to_string(),
            command,
            tab_id: tab_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        let response = tokio::time::timeout(
            self.timeout,
            self.client.request(subject.clone(), payload.into()),
        )
        .await
        .with_context(|| format!("Capture service did not answer on {}", subject))?
        .context("Capture request failed")?;

        let reply: CaptureReplyMessage =
            serde_json::from_slice(&response.payload).context("Invalid capture reply")?;

        if !reply.ok {
            anyhow::bail!(
                "capture service refused {}: {}",
                command,
                reply.error.unwrap_or_else(|| "no reason given".to_string())
            );
        }

        info!("Capture {} acknowledged on {}", command, subject);

        Ok(())
    }
}
