use thiserror::Error;

/// Errors returned by completion-service implementations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("completion API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The API answered successfully but carried no message content.
    #[error("completion API returned no content")]
    EmptyResponse,

    /// Client construction failed (bad key, bad base URL).
    #[error("configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Returns `true` for failures that may succeed when the call is repeated.
    ///
    /// Timeouts, connection failures, HTTP 429 and 5xx are transient.
    /// Configuration, client errors, and unparsable bodies are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::EmptyResponse => true,
            LlmError::Deserialize { .. } | LlmError::Config(_) => false,
        }
    }
}
