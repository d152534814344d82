//! Tool error types

use thiserror::Error;

/// Errors raised while dispatching a tool call
///
/// Dispatch captures these per call into the result record (`with_error`)
/// instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Wrap an arbitrary failure message from a tool handler
    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed(message.into())
    }
}
