//! Message types for provider-agnostic conversations

use crate::tools::ToolCall;
use serde::{Deserialize, Serialize};

/// Role in a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// Tool response
    Tool,
}

impl MessageRole {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// Name (tool name for tool responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool call ID (for tool responses)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Create an assistant message that requested tool calls
    #[must_use]
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(MessageRole::Assistant, content)
        }
    }

    /// Create a tool response message echoing the originating call
    #[must_use]
    pub fn tool_response(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            name: Some(call.name.clone()),
            tool_call_id: Some(call.id.clone()),
            ..Self::with_role(MessageRole::Tool, content)
        }
    }
}

/// Join all system messages with a blank line.
///
/// Every adapter sends at most one logical system prompt, so this is the
/// single place where multiple `system` turns get merged.
#[must_use]
pub fn merge_system_messages(messages: &[Message]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System && !m.content.is_empty())
        .map(|m| m.content.as_str())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn test_message_creation() {
        let system = Message::system("You are a helpful assistant");
        assert_eq!(system.role, MessageRole::System);

        let user = Message::user("Hello!");
        assert_eq!(user.role, MessageRole::User);

        let call = ToolCall::new("call_123", "lookup_claim", Map::new());
        let assistant = Message::assistant_with_tool_calls("", vec![call.clone()]);
        assert_eq!(assistant.tool_calls.len(), 1);

        let tool = Message::tool_response(&call, r#"{"status": "approved"}"#);
        assert_eq!(tool.role, MessageRole::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_123"));
        assert_eq!(tool.name.as_deref(), Some("lookup_claim"));
    }

    #[test]
    fn test_merge_system_messages() {
        let messages = vec![
            Message::system("You are a roofing assistant."),
            Message::user("Hi"),
            Message::system(""),
            Message::system("Be concise."),
        ];
        assert_eq!(
            merge_system_messages(&messages).as_deref(),
            Some("You are a roofing assistant.\n\nBe concise.")
        );
        assert_eq!(merge_system_messages(&[Message::user("Hi")]), None);
    }

    #[test]
    fn test_empty_tool_calls_not_serialized() {
        let json = serde_json::to_value(Message::user("Hi")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert_eq!(json["role"], "user");
    }
}
