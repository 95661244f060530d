//! HTTP client for OpenAI-compatible chat completion APIs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::LlmError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ErrorEnvelope, ResponseFormat};
use crate::{CompletionOptions, CompletionService};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest error body excerpt carried into [`LlmError::Api`].
const MAX_ERROR_EXCERPT: usize = 300;

/// Client for a `chat/completions` endpoint.
///
/// Use [`ChatCompletionsClient::new`] for the default provider or
/// [`ChatCompletionsClient::with_base_url`] to point at another
/// OpenAI-compatible gateway or a mock server in tests.
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsClient {
    /// Creates a client for the default provider.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the key is blank and
    /// [`LlmError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for gateways and wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the key or base URL is blank and
    /// [`LlmError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key must be non-empty".to_owned()));
        }
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(LlmError::Config("base URL must be non-empty".to_owned()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vcode/0.1 (verbatim-coding)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: base_url.to_owned(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Turns a non-2xx body into [`LlmError::Api`], preferring the provider's
    /// `error.message` when the body carries one.
    fn api_error(status: u16, body: &str) -> LlmError {
        let message = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
            |_| body.chars().take(MAX_ERROR_EXCERPT).collect(),
            |envelope| envelope.error.message,
        );
        LlmError::Api { status, message }
    }
}

#[async_trait]
impl CompletionService for ChatCompletionsClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let started = Instant::now();
        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(
                model = %self.model,
                status = status.as_u16(),
                "completion request rejected"
            );
            return Err(Self::api_error(status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: "chat/completions".to_owned(),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(
            model = %self.model,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            chars = content.len(),
            "completion received"
        );

        Ok(content)
    }
}
