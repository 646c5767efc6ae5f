//! Workflow crate error types.

/// Unified error type for the workflow crate.
///
/// Normalization itself is total; only serialization can fail.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the workflow crate.
pub type Result<T> = std::result::Result<T, WorkflowError>;
