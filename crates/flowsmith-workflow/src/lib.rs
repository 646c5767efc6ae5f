//! Workflow document model for Flowsmith.
//!
//! This crate provides:
//!
//! - **Document model**: [`WorkflowDocument`] and [`NodeSpec`], serialized
//!   with the field names the n8n editor imports.
//! - **Normalizer**: [`normalize`] repairs a loosely structured candidate
//!   produced by a language model into a well-formed document.  It never
//!   fails.
//! - **Protocol**: the [`GenerationRequest`] / [`GenerationResponse`]
//!   envelope exchanged between the panel and the background service.

pub mod document;
pub mod error;
pub mod normalize;
pub mod protocol;

pub use document::{DEFAULT_NODE_TYPE, DEFAULT_WORKFLOW_NAME, NodeSpec, Position, WorkflowDocument};
pub use error::{Result, WorkflowError};
pub use normalize::{normalize, normalize_at};
pub use protocol::{GenerationRequest, GenerationResponse};
