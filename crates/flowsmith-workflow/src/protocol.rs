//! Messages exchanged between the panel and the background service.
//!
//! On the wire a request is `{"kind": "GENERATE_WORKFLOW", "prompt": "..."}`
//! and a response is either `{"success": true, "workflow": {...}}` or
//! `{"success": false, "error": "..."}`.  [`GenerationResponse`] is an enum,
//! so a value with both or neither payload cannot be constructed, and
//! decoding rejects such envelopes.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::document::WorkflowDocument;

/// A request sent from the foreground panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GenerationRequest {
    /// Turn a natural-language description into a workflow document.
    #[serde(rename = "GENERATE_WORKFLOW")]
    GenerateWorkflow {
        /// The user's description, verbatim.
        prompt: String,
    },
}

impl GenerationRequest {
    /// Build a `GENERATE_WORKFLOW` request.
    pub fn generate(prompt: impl Into<String>) -> Self {
        Self::GenerateWorkflow {
            prompt: prompt.into(),
        }
    }

    /// The prompt carried by this request.
    pub fn prompt(&self) -> &str {
        match self {
            Self::GenerateWorkflow { prompt } => prompt,
        }
    }
}

/// The background service's answer to a [`GenerationRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    /// Generation succeeded.
    Success { workflow: WorkflowDocument },
    /// Generation failed; `error` is a human-readable message.
    Failure { error: String },
}

impl GenerationResponse {
    pub fn success(workflow: WorkflowDocument) -> Self {
        Self::Success { workflow }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Convert into a `Result`, the shape callers usually want.
    pub fn into_result(self) -> std::result::Result<WorkflowDocument, String> {
        match self {
            Self::Success { workflow } => Ok(workflow),
            Self::Failure { error } => Err(error),
        }
    }
}

// -- Wire format -------------------------------------------------------------

#[derive(Serialize)]
struct WireResponseRef<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow: Option<&'a WorkflowDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[derive(Deserialize)]
struct WireResponse {
    success: bool,
    #[serde(default)]
    workflow: Option<WorkflowDocument>,
    #[serde(default)]
    error: Option<String>,
}

impl Serialize for GenerationResponse {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Success { workflow } => WireResponseRef {
                success: true,
                workflow: Some(workflow),
                error: None,
            },
            Self::Failure { error } => WireResponseRef {
                success: false,
                workflow: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GenerationResponse {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireResponse::deserialize(deserializer)?;
        match (wire.success, wire.workflow, wire.error) {
            (true, Some(workflow), None) => Ok(Self::Success { workflow }),
            (false, None, Some(error)) => Ok(Self::Failure { error }),
            (true, _, _) => Err(D::Error::custom(
                "successful response must carry `workflow` and no `error`",
            )),
            (false, _, _) => Err(D::Error::custom(
                "failed response must carry `error` and no `workflow`",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::normalize::normalize_at;

    #[test]
    fn request_wire_shape() {
        let value = serde_json::to_value(GenerationRequest::generate("email to slack")).unwrap();
        assert_eq!(
            value,
            json!({"kind": "GENERATE_WORKFLOW", "prompt": "email to slack"})
        );

        let parsed: GenerationRequest =
            serde_json::from_value(json!({"kind": "GENERATE_WORKFLOW", "prompt": "p"})).unwrap();
        assert_eq!(parsed.prompt(), "p");
    }

    #[test]
    fn unknown_request_kind_is_rejected() {
        let parsed = serde_json::from_value::<GenerationRequest>(json!({"kind": "PING"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn failure_wire_shape() {
        let value = serde_json::to_value(GenerationResponse::failure("quota exceeded")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "quota exceeded"}));
    }

    #[test]
    fn success_wire_shape() {
        let doc = normalize_at(Map::new(), 0);
        let value = serde_json::to_value(GenerationResponse::success(doc)).unwrap();
        assert_eq!(value["success"], Value::Bool(true));
        assert_eq!(value["workflow"]["name"], "Generated Workflow");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn ambiguous_envelopes_are_rejected() {
        let both = json!({
            "success": false,
            "error": "x",
            "workflow": serde_json::to_value(normalize_at(Map::new(), 0)).unwrap()
        });
        assert!(serde_json::from_value::<GenerationResponse>(both).is_err());

        let neither = json!({"success": true});
        assert!(serde_json::from_value::<GenerationResponse>(neither).is_err());

        let ok: GenerationResponse =
            serde_json::from_value(json!({"success": false, "error": "bad"})).unwrap();
        assert_eq!(ok.into_result(), Err("bad".to_owned()));
    }
}
