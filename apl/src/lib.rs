//! APL - Agent Prompt Language runtime
//!
//! APL documents declare multi-step LLM workflows in a markdown-ish source
//! format: an ordered set of named steps, each split into `pre`, `prompt` and
//! `post` phases. The runtime parses and validates a document, then drives a
//! state machine that renders templated expressions against a shared context,
//! builds chat messages (including multimodal attachments), calls a provider,
//! dispatches returned tool calls, validates outputs, and follows explicit
//! `next_step` transitions until the workflow terminates.
//!
//! # Core concepts
//!
//! - **Explicit termination**: a step that sets no `next_step` ends the run;
//!   there is no fall-through to the textually next step
//! - **One shared context**: every phase reads and writes a single in-memory
//!   context; a deep-cloned snapshot is appended to `context_history` after
//!   each step
//! - **Recoverable by default**: render, provider and tool failures land in
//!   the step's `errors` list so post-phase logic can branch on them; only
//!   unknown steps, timeouts and run budgets abort a run
//!
//! # Modules
//!
//! - [`parser`] - document parsing, static validation, relaxed-syntax lowerer
//! - [`document`] - the parsed step table
//! - [`template`] - expression layer and context helpers
//! - [`context`] - the shared run context and snapshots
//! - [`provider`] - provider adapter trait and envelope types
//! - [`tools`] - tool registration, description and dispatch
//! - [`schema`] - JSON Schema validation for structured output
//! - [`runtime`] - the step scheduler and `start`/`check` entry points
//!
//! # Example
//!
//! ```
//! # async fn demo() -> Result<(), apl::RuntimeError> {
//! let source = "\
//! # pre: greet
//! set('name', 'world')
//! # prompt: greet
//! Hello {{ name }}!
//! ";
//! let context = apl::start(source, apl::RunOptions::new()).await?;
//! assert_eq!(context.result_text, "Hello world!");
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod document;
pub mod parser;
pub mod provider;
pub mod runtime;
pub mod schema;
pub mod template;
pub mod tools;

// Re-export commonly used types
pub use context::{Context, ContextHandle};
pub use document::{Document, PromptBlock, Role, Step};
pub use parser::{ValidationError, check_reserved_variables, lower, parse_document};
pub use provider::{
    ChatMessage, Choice, ContentPart, EchoProvider, FunctionCall, MessageContent, MockProvider,
    Provider, ProviderError, ProviderRegistry, ProviderResponse, ResponseMessage, ToolCall,
};
pub use runtime::{Executor, RunOptions, RuntimeError, check, start};
pub use schema::validate_schema;
pub use tools::{FunctionTool, Tool, ToolCallResult, ToolError, ToolRegistry};
