/// LLM Client — the single point of entry for all completion-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// The classifier only sees the `CompletionBackend` trait.
///
/// One attempt per call, bounded by the client timeout. There is no retry
/// loop: a failed call fails the whole stage-2 batch upstream.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod options;

pub use options::{is_known_model, CompletionOptions, ReasoningEffort, Verbosity};
use options::supports_reasoning_controls;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One batched completion: an instruction plus the serialized items.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub instruction: &'a str,
    pub content: &'a str,
    pub options: &'a CompletionOptions,
}

/// "Send an instruction and a list of items, receive free text back."
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<ReasoningEffort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbosity: Option<Verbosity>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Wraps an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: String,
    default_model: String,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        default_model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_url = format!(
            "{}{CHAT_COMPLETIONS_PATH}",
            base_url.trim().trim_end_matches('/')
        );
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_url,
            api_key,
            default_model,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Makes a single call to the chat-completions API, returning the full response object.
    pub async fn call(
        &self,
        system: &str,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);
        let reasoning = supports_reasoning_controls(model);
        if !reasoning && (options.reasoning_effort.is_some() || options.verbosity.is_some()) {
            debug!("Model {model} takes no reasoning controls; dropping effort/verbosity");
        }

        let request_body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            reasoning_effort: options.reasoning_effort.filter(|_| reasoning),
            verbosity: options.verbosity.filter(|_| reasoning),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            // Try to parse error message
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&body)?;

        match &chat_response.usage {
            Some(usage) => info!(
                "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                chat_response.model.as_deref().unwrap_or(model),
                usage.prompt_tokens,
                usage.completion_tokens
            ),
            None => info!(
                "LLM call succeeded: model={}",
                chat_response.model.as_deref().unwrap_or(model)
            ),
        }

        Ok(chat_response)
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .call(request.instruction, request.content, request.options)
            .await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(strip_code_fences(text).to_string())
    }
}

/// Strips ```lang ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line.
    let body = match stripped.find('\n') {
        Some(idx) if !stripped[..idx].trim().contains(char::is_whitespace) => &stripped[idx + 1..],
        _ => stripped,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(body.trim())
}
