//! Scheduler-fatal runtime errors

use thiserror::Error;

use crate::parser::ValidationError;

/// Errors that abort a run
///
/// Everything else (render errors, provider and tool failures, invalid JSON
/// output, schema violations) is recoverable and lands in the context's
/// `errors` list instead. On a `RuntimeError` the partial context is
/// discarded.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No steps found in template")]
    EmptyDocument,

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Execution timeout after {0} ms")]
    Timeout(u64),

    #[error("Run budget exceeded")]
    RunBudgetExceeded,

    #[error("Execution failed: {0}")]
    Failed(String),
}
