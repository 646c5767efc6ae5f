//! Workflow generation for Flowsmith.
//!
//! This crate is the privileged half of the system: the only code that
//! talks to the completion endpoint and holds its credential.
//!
//! ## Architecture
//!
//! ```text
//! GenerationRequest ──> GenerationService ──> WorkflowGenerator
//!   (broker)               (handler)               │
//!                                    ┌─────────────┼──────────────┐
//!                                    v             v              v
//!                              prompt::compile  CompletionEndpoint  extract + normalize
//!                                               (GeminiClient)
//! ```
//!
//! ## Modules
//!
//! - [`config`] -- Generator configuration from TOML and the environment.
//! - [`llm`] -- Completion endpoint trait, Gemini client, and wire types.
//! - [`prompt`] -- Deterministic instruction builder.
//! - [`extract`] -- Locates the JSON object inside free-form model output.
//! - [`generator`] -- The single-shot generation pipeline.
//! - [`service`] -- Broker handler answering `GENERATE_WORKFLOW` requests.
//! - [`error`] -- Agent error types.

pub mod config;
pub mod error;
pub mod extract;
pub mod generator;
pub mod llm;
pub mod prompt;
pub mod service;

// Re-export the most commonly used types at the crate root.
pub use config::GeneratorConfig;
pub use error::{AgentError, Result};
pub use generator::WorkflowGenerator;
pub use llm::{CompletionEndpoint, GeminiClient, GenerationConfig};
pub use service::{GenerationClient, GenerationService, spawn_service};
