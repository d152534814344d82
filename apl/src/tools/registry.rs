//! ToolRegistry - tool description and dispatch

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::error::ToolError;
use super::traits::{Tool, ToolCallResult};
use crate::context::ContextHandle;
use crate::provider::ToolCall;

/// Registered tools for a run
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolRegistry::register");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Descriptors for the allowed tools, in `allowed` order
    ///
    /// Names without a registration are skipped.
    pub fn describe(&self, allowed: &[String]) -> Vec<Value> {
        allowed
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    /// Dispatch provider-returned tool calls sequentially
    ///
    /// Every call produces a result record; unknown tools, argument decode
    /// failures and handler errors are captured per call and never abort the
    /// batch.
    pub async fn dispatch(
        &self,
        calls: &[ToolCall],
        context: &ContextHandle,
    ) -> Vec<ToolCallResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            debug!(tool_name = %call.function.name, tool_id = %call.id, "dispatching tool call");
            let outcome = match self.tools.get(&call.function.name) {
                None => Err(ToolError::Unknown(call.function.name.clone())),
                Some(tool) => match serde_json::from_str::<Value>(&call.function.arguments) {
                    Err(e) => Err(ToolError::InvalidArguments(e.to_string())),
                    Ok(args) => tool.call(args, context).await,
                },
            };
            results.push(match outcome {
                Ok(content) => ToolCallResult::success(&call.id, content),
                Err(e) => {
                    debug!(tool_id = %call.id, error = %e, "tool call failed");
                    ToolCallResult::error(&call.id, e.to_string())
                }
            });
        }
        results
    }
}
