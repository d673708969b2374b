//! Provider failure classes.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    /// Request or quota limit exceeded. The caller may retry later.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Missing or rejected credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The provider account has run out of credit.
    #[error("insufficient credits: {0}")]
    InsufficientCredits(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response did not contain a structured result.
    #[error("unexpected response: {0}")]
    Response(String),
}

impl CompletionError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body).unwrap_or_else(|| body.to_string());
        match status {
            429 => Self::RateLimited(message),
            401 => Self::Authentication(message),
            402 => Self::InsufficientCredits(message),
            _ if mentions_credits(&message) => Self::InsufficientCredits(message),
            _ => Self::Api { status, message },
        }
    }

    /// Classify an `{"error": {...}}` object delivered with a 2xx status.
    pub fn from_error_body(error: &Value) -> Self {
        let status = error
            .get("code")
            .and_then(|c| c.as_u64().or_else(|| c.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(500) as u16;
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        Self::from_status(status, &message)
    }

    /// Whether retrying later can succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Network(_))
    }
}

/// Credit exhaustion is reported inconsistently across providers; match the
/// status code or the keyword anywhere in the message.
fn mentions_credits(message: &str) -> bool {
    message.contains("402") || message.to_lowercase().contains("credits")
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
