//! Provider envelope and chat message types
//!
//! These model the OpenAI-style chat completion wire shape but stay
//! provider-agnostic: adapters normalise whatever their backend returns into
//! this envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Role;

/// A chat message assembled from a rendered prompt segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a plain-text message
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create a multipart message
    pub fn parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Message content - either plain text or ordered multipart content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Text content if this is a plain-text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(_) => None,
        }
    }
}

/// One part of a multipart message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "image_url")]
    ImageUrl { image_url: UrlRef },

    #[serde(rename = "audio_input")]
    AudioInput { audio_input: UrlRef },

    #[serde(rename = "file")]
    File { file: UrlRef },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Build an attachment part of the given kind
    pub fn attachment(kind: AttachmentKind, url: impl Into<String>) -> Self {
        let url = UrlRef { url: url.into() };
        match kind {
            AttachmentKind::ImageUrl => ContentPart::ImageUrl { image_url: url },
            AttachmentKind::AudioInput => ContentPart::AudioInput { audio_input: url },
            AttachmentKind::File => ContentPart::File { file: url },
        }
    }
}

/// A URL wrapper matching the wire shape `{"url": …}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRef {
    pub url: String,
}

/// Kind of a line-anchored `@<kind> <url>` attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    ImageUrl,
    AudioInput,
    File,
}

impl AttachmentKind {
    /// Parse the attachment sigil name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "image_url" => Some(AttachmentKind::ImageUrl),
            "audio_input" => Some(AttachmentKind::AudioInput),
            "file" => Some(AttachmentKind::File),
            _ => None,
        }
    }
}

/// Normalised provider response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Opaque usage statistics, stored verbatim in the context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl ProviderResponse {
    /// Build a single-choice plain-text reply
    pub fn text_reply(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    role: role.into(),
                    content: Some(MessageContent::Text(text.into())),
                    tool_calls: Vec::new(),
                },
            }],
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Value) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// One completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// The assistant message inside a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub content: Option<MessageContent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type", default = "default_tool_call_kind")]
    pub kind: String,

    pub function: FunctionCall,
}

fn default_tool_call_kind() -> String {
    "function".to_string()
}

/// The function name and JSON-encoded arguments of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message_serialises_flat() {
        let msg = ChatMessage::text(Role::User, "hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_multipart_message_wire_shape() {
        let msg = ChatMessage::parts(
            Role::User,
            vec![
                ContentPart::text("look at this"),
                ContentPart::attachment(AttachmentKind::ImageUrl, "https://x/y.png"),
            ],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "look at this"},
                    {"type": "image_url", "image_url": {"url": "https://x/y.png"}},
                ]
            })
        );
    }

    #[test]
    fn test_envelope_deserialises_with_defaults() {
        let envelope: ProviderResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "ok"}}]
        }))
        .unwrap();
        assert_eq!(envelope.choices.len(), 1);
        assert!(envelope.usage.is_none());
        assert!(envelope.choices[0].message.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_call_kind_defaults_to_function() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_1",
            "function": {"name": "lookup", "arguments": "{}"}
        }))
        .unwrap();
        assert_eq!(call.kind, "function");
    }
}
