//! The generation pipeline.
//!
//! One call to [`WorkflowGenerator::generate`] compiles the instruction,
//! issues exactly one completion request, extracts the JSON object from the
//! reply and normalizes it.  Nothing is retried.

use std::sync::Arc;

use flowsmith_workflow::{WorkflowDocument, normalize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{AgentError, Result};
use crate::extract::extract_json_object;
use crate::llm::{CompletionEndpoint, GenerationConfig};
use crate::prompt;

/// Turns natural-language descriptions into workflow documents.
#[derive(Clone)]
pub struct WorkflowGenerator {
    endpoint: Arc<dyn CompletionEndpoint>,
    generation: GenerationConfig,
}

impl WorkflowGenerator {
    /// Create a generator calling `endpoint` with `generation` settings.
    pub fn new(endpoint: Arc<dyn CompletionEndpoint>, generation: GenerationConfig) -> Self {
        Self {
            endpoint,
            generation,
        }
    }

    /// Generate a workflow for `user_prompt`.
    pub async fn generate(&self, user_prompt: &str) -> Result<WorkflowDocument> {
        let user_prompt = user_prompt.trim();
        if user_prompt.is_empty() {
            return Err(AgentError::EmptyPrompt);
        }

        info!(prompt_len = user_prompt.len(), "generating workflow");
        let instruction = prompt::compile(user_prompt);
        let completion = self.endpoint.complete(&instruction, &self.generation).await?;

        let candidate = parse_candidate(&completion)?;
        let document = normalize(candidate);
        info!(
            name = %document.name,
            nodes = document.nodes.len(),
            "workflow generated"
        );
        Ok(document)
    }
}

/// Extract and parse the workflow object from raw completion text.
pub fn parse_candidate(text: &str) -> Result<Map<String, Value>> {
    let Some(json) = extract_json_object(text) else {
        debug!(chars = text.len(), "completion contained no JSON object");
        return Err(AgentError::malformed("no JSON found in model response"));
    };

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AgentError::malformed("model response is not a JSON object")),
        Err(e) => Err(AgentError::malformed(format!("invalid workflow JSON: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
