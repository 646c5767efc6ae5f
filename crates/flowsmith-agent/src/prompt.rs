//! Instruction builder.
//!
//! [`compile`] wraps a user's description in the fixed instruction that asks
//! the model for one n8n workflow document and nothing else.  The output
//! depends only on the input text.

use flowsmith_workflow::DEFAULT_WORKFLOW_NAME;

/// Node types the model is pointed at, with a one-line purpose each.
pub const NODE_CATALOG: &[(&str, &str)] = &[
    ("n8n-nodes-base.webhook", "HTTP triggers"),
    ("n8n-nodes-base.httpRequest", "API calls"),
    ("n8n-nodes-base.code", "JavaScript execution"),
    ("n8n-nodes-base.gmail", "Gmail operations"),
    ("n8n-nodes-base.slack", "Slack messaging"),
    ("n8n-nodes-base.set", "data transformation"),
    ("n8n-nodes-base.if", "conditional logic"),
    ("n8n-nodes-base.scheduleTrigger", "time-based triggers"),
    ("n8n-nodes-base.merge", "combine data"),
];

/// A complete document shown to the model as a reference.
pub const EXAMPLE_WORKFLOW: &str = r##"{
  "name": "Email to Slack Notification",
  "nodes": [
    {
      "parameters": {
        "httpMethod": "POST",
        "path": "webhook-test",
        "responseMode": "onReceived"
      },
      "name": "Webhook",
      "type": "n8n-nodes-base.webhook",
      "typeVersion": 1,
      "position": [240, 300],
      "id": "webhook1"
    },
    {
      "parameters": {
        "channel": "#general",
        "text": "New email received: {{$json.subject}}"
      },
      "name": "Slack",
      "type": "n8n-nodes-base.slack",
      "typeVersion": 1,
      "position": [540, 300],
      "id": "slack1"
    }
  ],
  "connections": {
    "Webhook": {
      "main": [[{"node": "Slack", "type": "main", "index": 0}]]
    }
  },
  "active": false,
  "settings": {},
  "staticData": {}
}"##;

const ROLE: &str = "You are an expert n8n workflow generator. \
Turn the user's description into one complete n8n workflow JSON document.";

const OUTPUT_CONTRACT: &str = "CRITICAL: Return ONLY valid JSON. \
No explanations, no markdown fences, no text before or after the document.";

const LAYOUT_RULES: &str = "Node positioning rules:
- The first node sits at [240, 300]
- Each following node is 300px further right: [240, 300], [540, 300], [840, 300]
- Give every node a unique id such as \"webhook1\", \"slack1\", \"code1\"";

/// Build the full instruction for `user_prompt`.
pub fn compile(user_prompt: &str) -> String {
    let mut out = String::with_capacity(2048 + user_prompt.len());

    out.push_str(ROLE);
    out.push_str("\n\n");
    out.push_str(OUTPUT_CONTRACT);
    out.push_str("\n\nRequired JSON structure:\n");
    out.push_str(&skeleton());
    out.push_str("\n\nCommon n8n node types:\n");
    for (node_type, purpose) in NODE_CATALOG {
        out.push_str(&format!("- {node_type} ({purpose})\n"));
    }
    out.push('\n');
    out.push_str(LAYOUT_RULES);
    out.push_str("\n\nExample workflow:\n");
    out.push_str(EXAMPLE_WORKFLOW);
    out.push_str(&format!("\n\nNow create a workflow for: \"{user_prompt}\""));

    out
}

fn skeleton() -> String {
    format!(
        r#"{{
  "name": "{DEFAULT_WORKFLOW_NAME}",
  "nodes": [
    {{
      "parameters": {{}},
      "name": "Node Name",
      "type": "n8n-nodes-base.nodeType",
      "typeVersion": 1,
      "position": [x, y],
      "id": "unique-id"
    }}
  ],
  "connections": {{}},
  "active": false,
  "settings": {{}},
  "staticData": {{}}
}}"#
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
