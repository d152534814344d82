//! Run options
//!
//! Everything `start` accepts besides the document: budgets, the relaxed
//! lowerer toggle, tool and provider registrations, and initial context
//! variables. Plain scalar options (`base_url`, `api_key`, `debug`) are also
//! mirrored into the context so templates and providers can read them.

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::context::Context;
use crate::provider::{Provider, ProviderRegistry};
use crate::tools::{Tool, ToolRegistry};

/// Default wall-clock budget for a run, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Options for one run
pub struct RunOptions {
    /// Wall-clock budget in milliseconds
    pub timeout_ms: u64,
    /// Prompt-phase budget across the whole run; `None` is unbounded
    pub max_runs: Option<u64>,
    /// Passed through to providers via the context
    pub base_url: Option<String>,
    /// Passed through to providers via the context
    pub api_key: Option<String>,
    /// Log rendered phase output
    pub debug: bool,
    /// Apply the relaxed-syntax lowerer before parsing
    pub relaxed: bool,
    /// Registered tools
    pub tools: ToolRegistry,
    /// Registered providers
    pub providers: ProviderRegistry,
    /// Initial context variables (user-settable keys and ad-hoc values)
    pub vars: Map<String, Value>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_runs: None,
            base_url: None,
            api_key: None,
            debug: false,
            relaxed: true,
            tools: ToolRegistry::new(),
            providers: ProviderRegistry::new(),
            vars: Map::new(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn max_runs(mut self, max_runs: u64) -> Self {
        self.max_runs = Some(max_runs);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Disable the relaxed-syntax lowerer (canonical delimiters only)
    pub fn relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Seed one context variable (e.g. `model`, `temperature`, `allowed_tools`)
    pub fn var(mut self, key: impl Into<String>, value: Value) -> Self {
        self.vars.insert(key.into(), value);
        self
    }

    /// Shallow-merge a map into the initial context
    pub fn with_context(mut self, vars: Map<String, Value>) -> Self {
        self.vars.extend(vars);
        self
    }

    /// Register a tool
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.register(tool);
        self
    }

    /// Register a provider for a model name
    pub fn with_provider(mut self, model: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        self.providers.register(model, provider);
        self
    }

    /// Replace the fallback provider
    pub fn default_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.set_default(provider);
        self
    }

    /// Build the initial context: executor defaults, then option variables
    pub(crate) fn build_context(&self) -> Context {
        let mut context = Context::new();
        for (key, value) in &self.vars {
            context.vars.insert(key.clone(), value.clone());
        }
        if let Some(base_url) = &self.base_url {
            context.vars.insert("base_url".to_string(), json!(base_url));
        }
        if let Some(api_key) = &self.api_key {
            context.vars.insert("api_key".to_string(), json!(api_key));
        }
        if self.debug {
            context.vars.insert("debug".to_string(), json!(true));
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::new();
        assert_eq!(options.timeout_ms, 120_000);
        assert_eq!(options.max_runs, None);
        assert!(options.relaxed);
        assert!(!options.debug);
    }

    #[test]
    fn test_vars_override_context_defaults() {
        let context = RunOptions::new()
            .var("model", json!("gpt-4o-mini"))
            .var("temperature", json!(0.2))
            .build_context();
        assert_eq!(context.model(), "gpt-4o-mini");
        assert_eq!(context.vars["temperature"], json!(0.2));
    }

    #[test]
    fn test_with_context_merges_last() {
        let mut extra = Map::new();
        extra.insert("model".to_string(), json!("override"));
        let context = RunOptions::new()
            .var("model", json!("first"))
            .with_context(extra)
            .build_context();
        assert_eq!(context.model(), "override");
    }

    #[test]
    fn test_scalar_options_mirrored() {
        let context = RunOptions::new()
            .base_url("https://example.test")
            .debug(true)
            .build_context();
        assert_eq!(context.vars["base_url"], json!("https://example.test"));
        assert_eq!(context.vars["debug"], json!(true));
    }
}
