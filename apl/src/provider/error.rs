//! Provider error types

use thiserror::Error;

/// Errors surfaced by a provider adapter
///
/// Provider failures are recoverable at the run level: the executor records
/// them into the step's `errors` and continues with empty result fields.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider call failed: {0}")]
    Failed(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
