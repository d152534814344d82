//! EchoProvider - the built-in default adapter
//!
//! Replies deterministically with the text of the last prompt message, which
//! makes it suitable as the fallback in test and offline environments: two
//! identical runs produce identical contexts modulo timing.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::context::Context;
use crate::provider::types::{ContentPart, MessageContent, ProviderResponse};
use crate::provider::{Provider, ProviderError};

/// Default provider used when no registration matches the model
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for EchoProvider {
    async fn complete(&self, context: &Context) -> Result<ProviderResponse, ProviderError> {
        let reply = context
            .prompts
            .last()
            .map(|message| match &message.content {
                MessageContent::Text(text) => text.clone(),
                MessageContent::Parts(parts) => parts
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .unwrap_or_default();

        debug!(model = %context.model(), reply_len = reply.len(), "echo completion");

        let words = reply.split_whitespace().count() as u64;
        let usage = json!({
            "prompt_tokens": words,
            "completion_tokens": words,
            "total_tokens": words * 2,
        });

        Ok(ProviderResponse::text_reply("assistant", reply).with_usage(usage))
    }
}
