//! Extraction failures and their HTTP mapping.

use instagraph_llm::CompletionError;
use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "API rate limit exceeded. Please try again later.";
pub const AUTH_MESSAGE: &str = "API authentication failed. Please check your API key.";
pub const CREDITS_MESSAGE: &str = "Insufficient API credits. Please add more credits to your OpenRouter account at https://openrouter.ai/settings/credits";
pub const GENERIC_MESSAGE: &str =
    "An error occurred while processing your request. Please try again.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No input provided")]
    EmptyInput,

    #[error("Could not retrieve content from URL: {0}")]
    Scrape(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Model output that neither repair nor schema binding could accept.
    #[error("model output rejected: {0}")]
    Malformed(instagraph_core::Error),

    /// The graph was accepted but the backend failed to record it.
    #[error("An error occurred during the Graph operation: {0}")]
    Persistence(instagraph_core::Error),
}

impl ExtractError {
    pub fn status_code(&self) -> u16 {
        match self {
            ExtractError::EmptyInput | ExtractError::Scrape(_) | ExtractError::Malformed(_) => 400,
            ExtractError::Completion(CompletionError::RateLimited(_)) => 429,
            ExtractError::Completion(CompletionError::Authentication(_)) => 401,
            ExtractError::Completion(CompletionError::InsufficientCredits(_)) => 402,
            ExtractError::Completion(_) => 400,
            ExtractError::Persistence(_) => 500,
        }
    }

    /// Message returned to the caller in `{"error": ...}`.
    pub fn user_message(&self) -> String {
        match self {
            ExtractError::Completion(CompletionError::RateLimited(_)) => RATE_LIMIT_MESSAGE.into(),
            ExtractError::Completion(CompletionError::Authentication(_)) => AUTH_MESSAGE.into(),
            ExtractError::Completion(CompletionError::InsufficientCredits(_)) => {
                CREDITS_MESSAGE.into()
            }
            ExtractError::Completion(_) | ExtractError::Malformed(_) => GENERIC_MESSAGE.into(),
            other => other.to_string(),
        }
    }
}
