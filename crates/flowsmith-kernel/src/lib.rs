//! Flowsmith kernel.
//!
//! This crate provides the plumbing that connects the untrusted foreground
//! context (the panel injected into the editor page) with the privileged
//! background context that is allowed to talk to the completion endpoint:
//!
//! - **[`broker`]** -- Typed request/response broker.  Each call owns a
//!   [`tokio::sync::oneshot`] reply slot; the background side registers a
//!   single [`RequestHandler`] and serves every request on its own task.
//! - **[`error`]** -- Unified kernel error types via [`thiserror`].
//!
//! All public types are `Send + Sync` and designed for use within a
//! multi-threaded tokio runtime.

pub mod broker;
pub mod error;

// Re-export the most commonly used types at the crate root for convenience.
pub use broker::{BrokerClient, BrokerServer, RequestHandler, ServeHandle, channel};
pub use error::{KernelError, Result};
