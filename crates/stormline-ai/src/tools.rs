//! Tool types for function calling

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool definition supplied with a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Parameters as an object schema.
    ///
    /// Anything that is not a JSON object (null, missing, a bare type) is
    /// replaced with an empty object schema so every provider receives a
    /// valid declaration.
    #[must_use]
    pub fn object_schema(&self) -> Value {
        match &self.parameters {
            Value::Object(map) if !map.is_empty() => {
                let mut map = map.clone();
                map.entry("type").or_insert_with(|| Value::String("object".into()));
                if map.get("type").and_then(Value::as_str) == Some("object") {
                    map.entry("properties")
                        .or_insert_with(|| Value::Object(Map::new()));
                }
                Value::Object(map)
            }
            _ => serde_json::json!({"type": "object", "properties": {}}),
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID, echoed back in the tool-result message
    pub id: String,
    /// Tool name
    pub name: String,
    /// Decoded arguments
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a new tool call
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Deserialize arguments into a typed value
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(Value::Object(self.arguments.clone()))
            .map_err(|e| crate::Error::InvalidResponse(e.to_string()))
    }

    /// Arguments re-encoded as a JSON string (OpenAI wire shape)
    #[must_use]
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// Decode raw tool-call argument text.
///
/// Empty text means "no arguments". Malformed JSON or a non-object value
/// returns `None` and the caller drops that single call.
#[must_use]
pub fn parse_tool_arguments(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Map::new());
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Build a tool call from raw argument text, logging and dropping it if malformed
pub(crate) fn tool_call_from_raw(id: String, name: String, raw: &str) -> Option<ToolCall> {
    match parse_tool_arguments(raw) {
        Some(arguments) => Some(ToolCall { id, name, arguments }),
        None => {
            tracing::warn!(tool = %name, call_id = %id, "Dropping tool call with malformed arguments");
            None
        }
    }
}
