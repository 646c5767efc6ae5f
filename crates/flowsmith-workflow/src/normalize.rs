//! Candidate repair.
//!
//! Language models get the overall shape of a workflow right far more often
//! than every detail.  [`normalize`] turns whatever object the model produced
//! into a [`WorkflowDocument`] by filling defaults instead of rejecting:
//!
//! 1. a missing or empty `name` becomes [`DEFAULT_WORKFLOW_NAME`];
//! 2. `nodes` that is missing or not an array becomes empty;
//! 3. `connections`, `settings` and `staticData` that are missing or not
//!    objects become `{}`;
//! 4. `active` is forced to `false`;
//! 5. each node gets a unique `id`, a positive `typeVersion`, a `position`
//!    (falling back to the fixed horizontal layout) and `parameters`.
//!
//! Only a top-level value that is not an object is out of reach; the
//! signature takes a [`Map`] so that case is handled by the caller.

use std::collections::HashSet;

use chrono::Utc;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::document::{
    DEFAULT_NODE_TYPE, DEFAULT_WORKFLOW_NAME, NodeSpec, Position, WorkflowDocument,
};

/// Normalize `candidate`, stamping generated node ids with the current time.
pub fn normalize(candidate: Map<String, Value>) -> WorkflowDocument {
    normalize_at(candidate, Utc::now().timestamp_millis())
}

/// Normalize `candidate` using `timestamp_millis` for generated node ids.
///
/// Identical inputs and timestamps always produce identical documents.
pub fn normalize_at(mut candidate: Map<String, Value>, timestamp_millis: i64) -> WorkflowDocument {
    let name = match candidate.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        _ => DEFAULT_WORKFLOW_NAME.to_owned(),
    };

    let raw_nodes = match candidate.remove("nodes") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(found = %type_name(&other), "`nodes` is not an array, discarding");
            Vec::new()
        }
        None => Vec::new(),
    };

    let connections = take_object(&mut candidate, "connections");
    let settings = take_object(&mut candidate, "settings");
    let static_data = take_object(&mut candidate, "staticData");

    // Generated automations are never switched on by us.
    candidate.remove("active");

    let mut seen_ids = HashSet::with_capacity(raw_nodes.len());
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for item in raw_nodes {
        let Value::Object(raw) = item else {
            warn!(found = %type_name(&item), "dropping node that is not an object");
            continue;
        };
        let index = nodes.len();
        nodes.push(normalize_node(raw, index, timestamp_millis, &mut seen_ids));
    }

    let document = WorkflowDocument {
        name,
        nodes,
        connections,
        active: false,
        settings,
        static_data,
        extra: candidate,
    };

    let dangling = document.dangling_connections();
    if !dangling.is_empty() {
        warn!(sources = ?dangling, "connections reference unknown nodes");
    }

    debug!(
        name = %document.name,
        nodes = document.nodes.len(),
        "workflow normalized"
    );
    document
}

/// Repair a single node at ordinal `index`.
fn normalize_node(
    mut raw: Map<String, Value>,
    index: usize,
    timestamp_millis: i64,
    seen_ids: &mut HashSet<String>,
) -> NodeSpec {
    let id = match raw.remove("id") {
        Some(Value::String(id)) if !id.is_empty() && !seen_ids.contains(&id) => id,
        Some(Value::String(id)) if !id.is_empty() => {
            debug!(id = %id, index, "duplicate node id replaced");
            generated_id(index, timestamp_millis, seen_ids)
        }
        _ => generated_id(index, timestamp_millis, seen_ids),
    };
    seen_ids.insert(id.clone());

    let name = match raw.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        _ => format!("Node {}", index + 1),
    };

    let node_type = match raw.remove("type") {
        Some(Value::String(t)) if !t.trim().is_empty() => t,
        _ => DEFAULT_NODE_TYPE.to_owned(),
    };

    let type_version = match raw.remove("typeVersion") {
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v > 0.0) => n,
        _ => Number::from(1),
    };

    let position = raw
        .remove("position")
        .as_ref()
        .and_then(Position::from_value)
        .unwrap_or_else(|| Position::for_index(index));

    let parameters = take_object(&mut raw, "parameters");

    NodeSpec {
        parameters,
        name,
        node_type,
        type_version,
        position,
        id,
        extra: raw,
    }
}

/// `node_<timestamp>_<index>`, suffixed until it collides with nothing.
fn generated_id(index: usize, timestamp_millis: i64, seen_ids: &HashSet<String>) -> String {
    let base = format!("node_{timestamp_millis}_{index}");
    let mut candidate = base.clone();
    let mut suffix = 1u32;
    while seen_ids.contains(&candidate) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    candidate
}

/// Remove `key` and return it if it is an object, otherwise an empty map.
fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            warn!(key, found = %type_name(&other), "expected an object, using {{}}");
            Map::new()
        }
        None => Map::new(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
