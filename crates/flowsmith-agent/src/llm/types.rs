//! Wire types for the completion endpoint.
//!
//! The endpoint speaks the Gemini `generateContent` format: a request holds
//! one text part plus a `generationConfig`, and a response holds zero or more
//! `candidates`, each with content `parts`.  Only the first candidate's first
//! text part is ever read.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};

/// Sampling temperature used for workflow generation.
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Output token ceiling used for workflow generation.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Generation settings sent with every completion request.
///
/// The defaults keep output close to deterministic and short enough that a
/// complete JSON document fits without truncation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Build the JSON body for a `generateContent` call.
///
/// `config` is omitted for bare requests such as the connection test.
pub fn build_request_body(text: &str, config: Option<&GenerationConfig>) -> Value {
    let mut body = json!({
        "contents": [{
            "parts": [{ "text": text }],
        }],
    });

    if let Some(config) = config {
        body["generationConfig"] = json!(config);
    }

    body
}

/// Pull `candidates[0].content.parts[0].text` out of a response envelope.
pub fn parse_completion_text(v: &Value) -> Result<String> {
    let candidate = v["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| AgentError::malformed("response contains no candidates"))?;

    candidate["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(|part| part["text"].as_str())
        .map(str::to_owned)
        .ok_or_else(|| AgentError::malformed("first candidate has no text content"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
