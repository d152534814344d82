//! Closure-backed tool registration
//!
//! [`FunctionTool`] wraps an async closure together with its descriptor.
//! Descriptors are supplied at registration time through the builder; a tool
//! that wants the live context reads it through the handle its handler
//! receives, and one that does not simply ignores the argument.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Value, json};

use super::error::ToolError;
use super::traits::Tool;
use crate::context::ContextHandle;

type Handler =
    Arc<dyn Fn(Value, ContextHandle) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// A tool built from an async closure and an explicit descriptor
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
    descriptor: Option<Value>,
    handler: Handler,
}

impl FunctionTool {
    /// Start building a tool with the given name
    pub fn builder(name: impl Into<String>) -> FunctionToolBuilder {
        FunctionToolBuilder {
            name: name.into(),
            description: String::new(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
            descriptor: None,
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    fn descriptor(&self) -> Value {
        match &self.descriptor {
            // An explicit full descriptor is used verbatim
            Some(descriptor) => descriptor.clone(),
            None => json!({
                "type": "function",
                "function": {
                    "name": self.name,
                    "description": self.description,
                    "parameters": self.parameters,
                }
            }),
        }
    }

    async fn call(&self, args: Value, context: &ContextHandle) -> Result<Value, ToolError> {
        (self.handler)(args, context.clone()).await
    }
}

/// Builder for [`FunctionTool`]
pub struct FunctionToolBuilder {
    name: String,
    description: String,
    parameters: Value,
    descriptor: Option<Value>,
}

impl FunctionToolBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// JSON Schema for the argument object
    pub fn parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }

    /// Use a complete descriptor verbatim instead of deriving one
    pub fn descriptor(mut self, descriptor: Value) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Finish with the async handler
    pub fn handler<F, Fut>(self, f: F) -> FunctionTool
    where
        F: Fn(Value, ContextHandle) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        FunctionTool {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            descriptor: self.descriptor,
            handler: Arc::new(move |args, ctx| -> BoxFuture<'static, Result<Value, ToolError>> {
                Box::pin(f(args, ctx))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, new_handle};

    fn adder() -> FunctionTool {
        FunctionTool::builder("add_numbers")
            .description("Add two numbers")
            .parameters(json!({
                "type": "object",
                "properties": {
                    "a": {"type": "number"},
                    "b": {"type": "number"}
                },
                "required": ["a", "b"]
            }))
            .handler(|args, _ctx| async move {
                let a = args["a"].as_f64().unwrap_or(0.0);
                let b = args["b"].as_f64().unwrap_or(0.0);
                Ok(json!(a + b))
            })
    }

    #[test]
    fn test_derived_descriptor_shape() {
        let tool = adder();
        let descriptor = tool.descriptor();
        assert_eq!(descriptor["type"], "function");
        assert_eq!(descriptor["function"]["name"], "add_numbers");
        assert_eq!(descriptor["function"]["description"], "Add two numbers");
        assert!(descriptor["function"]["parameters"]["properties"].is_object());
    }

    #[test]
    fn test_explicit_descriptor_used_verbatim() {
        let custom = json!({"type": "function", "function": {"name": "other"}});
        let tool = FunctionTool::builder("x")
            .descriptor(custom.clone())
            .handler(|_, _| async { Ok(Value::Null) });
        assert_eq!(tool.descriptor(), custom);
    }

    #[tokio::test]
    async fn test_handler_invocation() {
        let tool = adder();
        let handle = new_handle(Context::new());
        let result = tool.call(json!({"a": 2, "b": 3}), &handle).await.unwrap();
        assert_eq!(result, json!(5.0));
    }

    #[tokio::test]
    async fn test_handler_can_mutate_context() {
        let tool = FunctionTool::builder("note").handler(|args, ctx| async move {
            crate::context::lock(&ctx).set_value("note", args).ok();
            Ok(json!("stored"))
        });
        let handle = new_handle(Context::new());
        tool.call(json!("remember me"), &handle).await.unwrap();
        assert_eq!(
            crate::context::lock(&handle).get_value("note"),
            Some(json!("remember me"))
        );
    }
}
