use thiserror::Error;
use vcode_core::CodeframeStatus;
use vcode_llm::LlmError;

#[derive(Debug, Error)]
pub enum CodeframeError {
    /// The group has no non-empty responses; pick different columns.
    #[error("no responses available for question group '{group_id}'")]
    EmptyInput { group_id: String },

    /// No prompt template is registered for the question type.
    #[error("unknown question type: {0}")]
    UnknownQuestionType(String),

    /// The completion service failed (network, rate limit, auth).
    #[error("generation service error: {0}")]
    GenerationService(#[source] LlmError),

    /// The model's text was not a usable `{"codeframe": [...]}` document.
    #[error("malformed codeframe: {0}")]
    MalformedCodeframe(String),

    /// The model's text was not a usable `{"assignments": [...]}` document.
    #[error("malformed code assignments: {0}")]
    MalformedAssignments(String),

    #[error("cannot {action} a codeframe in status '{from}'")]
    InvalidStateTransition {
        from: CodeframeStatus,
        action: &'static str,
    },

    /// Finalization refused: no substantive code is in use.
    #[error("cannot finalize codeframe '{group_id}': no non-catch-all code has any usage")]
    NoUsage { group_id: String },

    /// Full-dataset coding requires a finalized codeframe.
    #[error("codeframe '{group_id}' must be finalized before coding")]
    NotFinalized { group_id: String },
}

impl CodeframeError {
    /// Whether re-invoking the same operation may succeed.
    ///
    /// Malformed model output is retryable because the next attempt draws a
    /// fresh sample and a fresh completion.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CodeframeError::GenerationService(e) => e.is_transient(),
            CodeframeError::MalformedCodeframe(_) | CodeframeError::MalformedAssignments(_) => {
                true
            }
            CodeframeError::EmptyInput { .. }
            | CodeframeError::UnknownQuestionType(_)
            | CodeframeError::InvalidStateTransition { .. }
            | CodeframeError::NoUsage { .. }
            | CodeframeError::NotFinalized { .. } => false,
        }
    }
}

impl From<LlmError> for CodeframeError {
    fn from(err: LlmError) -> Self {
        CodeframeError::GenerationService(err)
    }
}
