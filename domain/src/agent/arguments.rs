//! Mapping tool-call arguments to a child agent's input text.
//!
//! An agent tool receives permissive arguments. They are turned into the
//! single user message sent to the child with a fixed precedence:
//!
//! 1. `text` is a string → used verbatim
//! 2. `json` is present → objects become canonical JSON, anything else is
//!    stringified
//! 3. any other keys → the whole argument map as canonical JSON
//! 4. nothing → empty string
//!
//! "Canonical" means object keys are emitted in sorted order, so the same
//! arguments always map to the same text.

use crate::tool::entities::ToolArguments;
use serde_json::Value;

/// Build the child's input text from raw tool arguments.
pub fn map_arguments(arguments: &ToolArguments) -> String {
    if let Some(Value::String(text)) = arguments.get("text") {
        return text.clone();
    }

    if let Some(json) = arguments.get("json") {
        return match json {
            Value::Object(_) => canonical_json(json),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }

    if arguments.is_empty() {
        return String::new();
    }

    let object: serde_json::Map<String, Value> = arguments
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    canonical_json(&Value::Object(object))
}

/// Serialize a value with object keys in sorted order.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
