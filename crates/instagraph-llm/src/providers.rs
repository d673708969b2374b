//! Completion client for OpenAI-compatible APIs (OpenAI, OpenRouter, ...).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::error::CompletionError;
use crate::schema::ToolSpec;
use crate::types::*;

/// One blocking, schema-constrained completion per call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` and return the JSON text the model produced for `tool`.
    async fn complete(&self, prompt: &str, tool: &ToolSpec) -> Result<String, CompletionError>;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool;
}

pub struct OpenAICompatClient {
    client: Client,
    config: LLMConfig,
}

impl OpenAICompatClient {
    pub fn new(config: LLMConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str, tool: &ToolSpec) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            tools: vec![ToolDefinition {
                kind: "function",
                function: FunctionDefinition {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            }],
            tool_choice: ToolChoice {
                kind: "function",
                function: ToolChoiceFunction {
                    name: tool.name.clone(),
                },
            },
        }
    }
}

/// Pull the structured arguments out of a response.
///
/// Prefers the forced tool call; falls back to plain content for gateways
/// that answer tool requests with a JSON message body.
fn extract_arguments(
    response: CompletionResponse,
    tool: &ToolSpec,
) -> Result<String, CompletionError> {
    if let Some(error) = response.error {
        return Err(CompletionError::from_error_body(&error));
    }

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| CompletionError::Response("no choices in response".into()))?;

    let tool_calls = message.tool_calls.unwrap_or_default();
    if let Some(call) = tool_calls
        .iter()
        .find(|c| c.function.name == tool.name)
        .or_else(|| tool_calls.first())
    {
        return Ok(call.function.arguments.clone());
    }

    message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CompletionError::Response("response carried no tool call".into()))
}

#[async_trait]
impl CompletionClient for OpenAICompatClient {
    async fn complete(&self, prompt: &str, tool: &ToolSpec) -> Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::Authentication("OPENAI_API_KEY not set".into()))?;

        let start = Instant::now();
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&self.build_request(prompt, tool))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Completion request failed");
                CompletionError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %body, "Completion API error");
            return Err(CompletionError::from_status(status.as_u16(), &body));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Response(e.to_string()))?;

        debug!(
            model = %self.config.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion finished"
        );

        extract_arguments(body, tool)
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}
