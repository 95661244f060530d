//! Text-completion service seam for codeframe generation and response coding.
//!
//! [`CompletionService`] is the only boundary the pipeline calls across.
//! [`ChatCompletionsClient`] implements it over any OpenAI-compatible
//! `chat/completions` endpoint.

pub mod client;
pub mod error;

mod types;

use async_trait::async_trait;

pub use client::ChatCompletionsClient;
pub use error::LlmError;

/// Per-call knobs. `None` leaves the provider default in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

/// A service that turns a system + user prompt into free-form text.
///
/// Implementations must not retry internally; callers decide retry policy.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}
