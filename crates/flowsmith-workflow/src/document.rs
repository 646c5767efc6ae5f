//! Workflow document types.
//!
//! A [`WorkflowDocument`] is the importable description of an automation: an
//! ordered list of [`NodeSpec`] steps plus the connections between them.
//! Keys the model emitted that are not modelled here are kept in the `extra`
//! maps so nothing the editor understands is silently lost.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::Result;

/// Label used when a candidate document has no usable name.
pub const DEFAULT_WORKFLOW_NAME: &str = "Generated Workflow";

/// Capability assigned to nodes that arrive without a type.
pub const DEFAULT_NODE_TYPE: &str = "n8n-nodes-base.noOp";

/// X coordinate of the first node in the default layout.
pub const LAYOUT_ORIGIN_X: f64 = 240.0;

/// Horizontal distance between consecutive nodes in the default layout.
pub const LAYOUT_PITCH_X: f64 = 300.0;

/// Y coordinate shared by all nodes in the default layout.
pub const LAYOUT_ROW_Y: f64 = 300.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A normalized workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    /// Human-readable workflow name.  Never empty.
    pub name: String,
    /// Steps in layout order.
    pub nodes: Vec<NodeSpec>,
    /// Edges keyed by source node name.  Passed through untouched.
    pub connections: Map<String, Value>,
    /// Always `false` once normalized.
    pub active: bool,
    /// Editor settings.
    pub settings: Map<String, Value>,
    /// Editor-managed static data.
    pub static_data: Map<String, Value>,
    /// Unmodelled top-level keys (e.g. `pinData`, `meta`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Capability-specific configuration.
    pub parameters: Map<String, Value>,
    /// Display label; the join key into [`WorkflowDocument::connections`].
    pub name: String,
    /// Namespaced capability identifier, e.g. `n8n-nodes-base.slack`.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Positive capability version.
    pub type_version: Number,
    /// Canvas coordinates.
    pub position: Position,
    /// Identifier, unique within the document.
    pub id: String,
    /// Unmodelled node keys (e.g. `credentials`, `disabled`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A canvas coordinate pair, serialized as `[x, y]`.
///
/// Whole-number coordinates are written as JSON integers, matching what the
/// editor itself exports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Default layout slot for the node at zero-based `index`:
    /// `[240 + index * 300, 300]`.
    pub fn for_index(index: usize) -> Self {
        Self::new(LAYOUT_ORIGIN_X + index as f64 * LAYOUT_PITCH_X, LAYOUT_ROW_Y)
    }

    /// Read a position from a JSON value.
    ///
    /// Only a two-element array of numbers qualifies.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [x, y] => Some(Self::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        }
    }
}

/// Render one coordinate, preferring an integer when nothing is lost.
fn coordinate_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&coordinate_value(self.x))?;
        seq.serialize_element(&coordinate_value(self.y))?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Self::new(x, y))
    }
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

impl WorkflowDocument {
    /// Serialize with two-space indentation, the form handed to the
    /// clipboard.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a node by its display name.
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Connection keys that do not name any node in the document.
    pub fn dangling_connections(&self) -> Vec<&str> {
        self.connections
            .keys()
            .filter(|source| self.node(source).is_none())
            .map(String::as_str)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn layout_slots_follow_fixed_pitch() {
        assert_eq!(Position::for_index(0), Position::new(240.0, 300.0));
        assert_eq!(Position::for_index(1), Position::new(540.0, 300.0));
        assert_eq!(Position::for_index(2), Position::new(840.0, 300.0));
    }

    #[test]
    fn position_from_value_requires_numeric_pair() {
        assert_eq!(
            Position::from_value(&json!([10, 20.5])),
            Some(Position::new(10.0, 20.5))
        );
        assert_eq!(Position::from_value(&json!([10])), None);
        assert_eq!(Position::from_value(&json!([1, 2, 3])), None);
        assert_eq!(Position::from_value(&json!(["1", 2])), None);
        assert_eq!(Position::from_value(&json!({"x": 1, "y": 2})), None);
    }

    #[test]
    fn whole_coordinates_serialize_as_integers() {
        let text = serde_json::to_string(&Position::new(240.0, 300.0)).unwrap();
        assert_eq!(text, "[240,300]");

        let text = serde_json::to_string(&Position::new(12.5, -4.0)).unwrap();
        assert_eq!(text, "[12.5,-4]");
    }

    #[test]
    fn document_uses_editor_field_names() {
        let doc = WorkflowDocument {
            name: "Demo".into(),
            nodes: vec![NodeSpec {
                parameters: Map::new(),
                name: "Webhook".into(),
                node_type: "n8n-nodes-base.webhook".into(),
                type_version: Number::from(1),
                position: Position::for_index(0),
                id: "webhook1".into(),
                extra: Map::new(),
            }],
            connections: Map::new(),
            active: false,
            settings: Map::new(),
            static_data: Map::new(),
            extra: Map::new(),
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("staticData").is_some());
        assert_eq!(value["nodes"][0]["type"], "n8n-nodes-base.webhook");
        assert_eq!(value["nodes"][0]["typeVersion"], 1);
        assert_eq!(value["nodes"][0]["position"], json!([240, 300]));

        let pretty = doc.to_pretty_json().unwrap();
        assert!(pretty.contains("\n  \"name\": \"Demo\""));
    }

    #[test]
    fn dangling_connections_are_reported() {
        let doc: WorkflowDocument = serde_json::from_value(json!({
            "name": "D",
            "nodes": [{
                "parameters": {}, "name": "A", "type": "t", "typeVersion": 1,
                "position": [0, 0], "id": "a"
            }],
            "connections": {"A": {}, "Ghost": {}},
            "active": false,
            "settings": {},
            "staticData": {}
        }))
        .unwrap();

        assert_eq!(doc.dangling_connections(), vec!["Ghost"]);
    }
}
