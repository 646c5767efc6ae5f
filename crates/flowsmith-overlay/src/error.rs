//! Error types for the overlay crate.

use flowsmith_kernel::KernelError;
use flowsmith_workflow::WorkflowError;
use thiserror::Error;

/// Failures surfaced while watching the page or running the panel.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The host page refused an operation (for example mounting markup).
    #[error("host page error: {reason}")]
    Host { reason: String },

    /// Writing to the clipboard failed.
    #[error("clipboard write failed: {reason}")]
    Clipboard { reason: String },

    /// The background service could not be reached.
    #[error(transparent)]
    Transport(#[from] KernelError),

    /// The generated document could not be serialized.
    #[error(transparent)]
    Encode(#[from] WorkflowError),

    /// A detection pattern did not compile.
    #[error("invalid detection pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Convenience alias for results within this crate.
pub type Result<T> = std::result::Result<T, OverlayError>;
