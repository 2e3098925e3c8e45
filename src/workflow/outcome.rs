use super::http::ApiStatusError;
use reqwest::StatusCode;
use serde::Serialize;

const RATE_LIMIT_MARKERS: &[&str] = &["429", "rate limit", "rate_limit", "too many requests"];
const PAYMENT_MARKERS: &[&str] = &["402", "payment", "credit", "billing", "quota"];

/// Result of a minutes generation run, as reported to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", content = "message", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Success,
    RateLimited,
    PaymentRequired,
    Generic(String),
}

impl GenerationOutcome {
    /// Classify a failed generation.
    ///
    /// A backend status answer decides by its code, then by its body. Any
    /// other error is judged by its root cause only: the context chain
    /// carries request URLs, and meeting ids in them are not markers.
    pub fn classify_error(error: &anyhow::Error) -> Self {
        let category = match error.chain().find_map(|e| e.downcast_ref::<ApiStatusError>()) {
            Some(api) => Self::from_status(api.status).or_else(|| Self::from_markers(&api.body)),
            None => Self::from_markers(&error.root_cause().to_string()),
        };

        category.unwrap_or_else(|| GenerationOutcome::Generic(format!("{:#}", error)))
    }

    /// Rate limiting wins over payment markers. URLs in the message are skipped.
    pub fn classify_message(message: &str) -> Self {
        Self::from_markers(message).unwrap_or_else(|| GenerationOutcome::Generic(message.to_string()))
    }

    fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::TOO_MANY_REQUESTS => Some(GenerationOutcome::RateLimited),
            StatusCode::PAYMENT_REQUIRED => Some(GenerationOutcome::PaymentRequired),
            _ => None,
        }
    }

    fn from_markers(text: &str) -> Option<Self> {
        let lowered = text
            .split_whitespace()
            .filter(|word| !word.contains("://"))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
            Some(GenerationOutcome::RateLimited)
        } else if PAYMENT_MARKERS.iter().any(|m| lowered.contains(m)) {
            Some(GenerationOutcome::PaymentRequired)
        } else {
            None
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success)
    }

    /// User-facing recovery guidance
    pub fn guidance(&self) -> String {
        match self {
            GenerationOutcome::Success => "Meeting minutes are ready.".to_string(),
            GenerationOutcome::RateLimited => {
                "Minutes generation is rate limited right now. Wait a few minutes, then generate the minutes manually from the meeting page.".to_string()
            }
            GenerationOutcome::PaymentRequired => {
                "Minutes generation needs available credits. Check the billing settings or API key, then generate the minutes manually.".to_string()
            }
            GenerationOutcome::Generic(message) => format!(
                "Minutes generation failed: {}. You can retry from the meeting page.",
                message
            ),
        }
    }
}
