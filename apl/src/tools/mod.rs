//! Tool invocation layer
//!
//! Tools are native async functions registered under a name together with an
//! explicit OpenAI-style descriptor. The registry describes the allowed
//! subset to the provider and dispatches provider-returned tool calls,
//! capturing per-call errors without aborting the batch.

mod error;
mod function;
mod registry;
mod traits;

pub use error::ToolError;
pub use function::{FunctionTool, FunctionToolBuilder};
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolCallResult};
