//! Kernel error types.
//!
//! All kernel subsystems surface errors through [`KernelError`], which is the
//! single error type returned by every public API in this crate.

/// Unified error type for the Flowsmith kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// The request/response channel itself failed: the background side is
    /// gone, was shut down, or dropped the reply slot without answering.
    #[error("transport error: {reason}")]
    Transport { reason: String },
}

impl KernelError {
    /// Shorthand for building a [`KernelError::Transport`].
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, KernelError>;
