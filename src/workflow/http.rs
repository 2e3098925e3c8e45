use super::api::{MeetingStatusUpdater, MinutesGenerator};
use crate::config::MinutesConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct GenerateMinutesRequest {
    pub elapsed_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateMinutesResponse {
    pub minutes: String,
}

#[derive(Debug, Serialize)]
pub struct MeetingStatusRequest {
    pub status: String,
    pub ended_at: DateTime<Utc>,
}

/// Non-2xx answer from the meeting backend
#[derive(Debug, thiserror::Error)]
#[error("request failed with status {status}: {body}")]
pub struct ApiStatusError {
    pub status: StatusCode,
    pub body: String,
}

/// Meeting backend client: minutes generation and meeting status updates
pub struct HttpMeetingApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMeetingApi {
    pub fn new(config: &MinutesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turn non-2xx responses into errors carrying the status code and body
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiStatusError { status, body }.into())
    }
}

#[async_trait::async_trait]
impl MinutesGenerator for HttpMeetingApi {
    async fn generate(&self, meeting_id: &str, elapsed_seconds: u64) -> Result<String> {
        info!(
            "Requesting minutes for meeting {} ({}s recorded)",
            meeting_id, elapsed_seconds
        );

        let request = self
            .client
            .post(self.url(&format!("meetings/{}/minutes", meeting_id)))
            .json(&GenerateMinutesRequest { elapsed_seconds });

        let response = self
            .authorize(request)
            .send()
            .await
            .context("Failed to reach minutes service")?;

        let body: GenerateMinutesResponse = Self::check(response)
            .await?
            .json()
            .await
            .context("Invalid minutes response")?;

        Ok(body.minutes)
    }
}

#[async_trait::async_trait]
impl MeetingStatusUpdater for HttpMeetingApi {
    async fn mark_completed(&self, meeting_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        let request = self
            .client
            .patch(self.url(&format!("meetings/{}", meeting_id)))
            .json(&MeetingStatusRequest {
                status: "completed".to_string(),
                ended_at,
            });

        let response = self
            .authorize(request)
            .send()
            .await
            .context("Failed to reach meeting service")?;
        Self::check(response).await?;

        info!("Meeting {} marked completed", meeting_id);
        Ok(())
    }
}
