//! Completion endpoint integration.
//!
//! - [`types`] -- Generation settings and response-envelope parsing.
//! - [`client`] -- The [`CompletionEndpoint`] seam and its Gemini
//!   implementation.

pub mod client;
pub mod types;

pub use client::{CompletionEndpoint, GeminiClient};
pub use types::{GenerationConfig, build_request_body, parse_completion_text};
