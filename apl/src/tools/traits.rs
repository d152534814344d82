//! Tool trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::error::ToolError;
use crate::context::ContextHandle;

/// A native function callable by the model
///
/// The registrant supplies the descriptor pieces explicitly; nothing is
/// introspected from function signatures at runtime.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the provider's tool-call name)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema for the argument object
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    /// OpenAI-style function descriptor offered to the provider
    fn descriptor(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }

    /// Execute with decoded arguments; the handle gives access to the live
    /// run context for tools that want it
    async fn call(&self, args: Value, context: &ContextHandle) -> Result<Value, ToolError>;
}

/// Result record of one dispatched tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Always `"tool"`
    pub role: String,
    pub tool_call_id: String,
    pub content: Value,
    pub with_error: bool,
}

impl ToolCallResult {
    /// Record a successful call
    pub fn success(tool_call_id: impl Into<String>, content: Value) -> Self {
        Self {
            role: "tool".to_string(),
            tool_call_id: tool_call_id.into(),
            content,
            with_error: false,
        }
    }

    /// Record a failed call, serialising the error message
    pub fn error(tool_call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            tool_call_id: tool_call_id.into(),
            content: Value::String(message.into()),
            with_error: true,
        }
    }
}
