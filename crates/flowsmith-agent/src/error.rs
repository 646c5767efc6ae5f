//! Agent error types.
//!
//! All agent subsystems surface errors through [`AgentError`].  Every
//! variant is terminal for the request that raised it; nothing here is
//! retried automatically.

/// Unified error type for the agent crate.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- Endpoint errors -----------------------------------------------------
    /// The completion endpoint could not be reached at all.
    #[error("completion request failed: {reason}")]
    RequestFailed { reason: String },

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint error: {status} {status_text}")]
    Upstream { status: u16, status_text: String },

    /// The endpoint answered, but its payload is not a workflow candidate.
    #[error("malformed model response: {reason}")]
    MalformedResponse { reason: String },

    // -- Input errors --------------------------------------------------------
    /// The prompt was empty after trimming.
    #[error("please enter a workflow description")]
    EmptyPrompt,

    // -- Configuration errors ------------------------------------------------
    /// No credential was provided for the endpoint.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    Config { reason: String },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Shorthand for building an [`AgentError::MalformedResponse`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed {
            reason: err.to_string(),
        }
    }
}
