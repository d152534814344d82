//! MockProvider - scripted responses for test environments

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::context::Context;
use crate::provider::types::ProviderResponse;
use crate::provider::{Provider, ProviderError};

/// Provider returning a fixed queue of responses
///
/// Each `complete` call pops the next scripted response; an exhausted queue
/// is an error so tests notice unexpected extra calls.
pub struct MockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        debug!(response_count = responses.len(), "MockProvider::new");
        Self {
            responses: Mutex::new(responses.into()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// A mock that always replies with the same text
    pub fn repeating(text: impl Into<String>) -> RepeatingProvider {
        RepeatingProvider {
            response: ProviderResponse::text_reply("assistant", text),
        }
    }

    /// Number of completions served so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, _context: &Context) -> Result<ProviderResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut queue = self
                .responses
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            queue.pop_front()
        };
        next.ok_or_else(|| ProviderError::InvalidResponse("No more mock responses".to_string()))
    }
}

/// Provider replying with one fixed response forever
#[derive(Debug, Clone)]
pub struct RepeatingProvider {
    response: ProviderResponse,
}

#[async_trait]
impl Provider for RepeatingProvider {
    async fn complete(&self, _context: &Context) -> Result<ProviderResponse, ProviderError> {
        Ok(self.response.clone())
    }
}
