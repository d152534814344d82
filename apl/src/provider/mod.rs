//! Provider adapter interface
//!
//! A provider is a single abstract call taking the current context and
//! returning a normalized chat-completion envelope. Adapters read whatever
//! request variables they support from the context (`prompts`, `tools`,
//! `model`, sampling parameters, output mode); the runtime never speaks HTTP
//! itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::context::Context;

mod echo;
mod error;
pub mod mock;
mod types;

pub use echo::EchoProvider;
pub use error::ProviderError;
pub use mock::MockProvider;
pub use types::{
    AttachmentKind, ChatMessage, Choice, ContentPart, FunctionCall, MessageContent,
    ProviderResponse, ResponseMessage, ToolCall, UrlRef,
};

/// A chat-completion backend
///
/// The context is handed over with read-only intent; the executor applies
/// the response itself. Cancellation on timeout is delegated to the adapter.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, context: &Context) -> Result<ProviderResponse, ProviderError>;
}

/// Model-name to adapter routing with a default fallback
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    default: Arc<dyn Provider>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create a registry whose fallback is the deterministic [`EchoProvider`]
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default: Arc::new(EchoProvider::new()),
        }
    }

    /// Register an adapter for a model name
    pub fn register(&mut self, model: impl Into<String>, provider: Arc<dyn Provider>) {
        let model = model.into();
        debug!(%model, "ProviderRegistry::register");
        self.providers.insert(model, provider);
    }

    /// Replace the default adapter used when no model matches
    pub fn set_default(&mut self, provider: Arc<dyn Provider>) {
        self.default = provider;
    }

    /// Resolve the adapter for a model, falling back to the default
    pub fn resolve(&self, model: &str) -> Arc<dyn Provider> {
        match self.providers.get(model) {
            Some(provider) => Arc::clone(provider),
            None => {
                debug!(%model, "no provider registered, using default");
                Arc::clone(&self.default)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::MessageContent;

    #[tokio::test]
    async fn test_resolve_falls_back_to_default() {
        let registry = ProviderRegistry::new();
        let provider = registry.resolve("some-unknown-model");
        let ctx = Context::new();
        // The default echo provider answers without a registration
        assert!(provider.complete(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_prefers_registration() {
        let mut registry = ProviderRegistry::new();
        registry.register(
            "scripted",
            Arc::new(MockProvider::new(vec![ProviderResponse::text_reply(
                "assistant",
                "from mock",
            )])),
        );

        let provider = registry.resolve("scripted");
        let response = provider.complete(&Context::new()).await.unwrap();
        assert_eq!(
            response.choices[0].message.content,
            Some(MessageContent::Text("from mock".into()))
        );
    }
}
