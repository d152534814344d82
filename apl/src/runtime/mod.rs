//! Runtime entry points
//!
//! `start` lowers, parses and executes a document against the configured
//! providers and tools, returning the final context. `check` runs only the
//! static front half.

use tracing::debug;

use crate::context::Context;
use crate::document::Document;
use crate::parser::{self, ValidationError};

mod engine;
mod error;
mod options;
mod prompt;
mod response;

pub use engine::Executor;
pub use error::RuntimeError;
pub use options::{DEFAULT_TIMEOUT_MS, RunOptions};

/// Lower (if enabled) and parse a document
pub fn prepare(source: &str, relaxed: bool) -> Result<Document, ValidationError> {
    if relaxed {
        let lowered = parser::lower(source);
        debug!(
            original_len = source.len(),
            lowered_len = lowered.len(),
            "applied relaxed-syntax lowerer"
        );
        parser::parse_document(&lowered)
    } else {
        parser::parse_document(source)
    }
}

/// Execute a document and return the final context
///
/// Validation failures surface before execution; scheduler-fatal conditions
/// (unknown step, timeout, run budget) abort the run and discard the partial
/// context. A panic escaping the step loop is reported as
/// `RuntimeError::Failed`.
pub async fn start(source: &str, options: RunOptions) -> Result<Context, RuntimeError> {
    let document = prepare(source, options.relaxed)?;
    let executor = Executor::new(document, options);
    match tokio::spawn(executor.run()).await {
        Ok(result) => result,
        Err(e) => Err(RuntimeError::Failed(e.to_string())),
    }
}

/// Validate a document without executing it
///
/// Applies the relaxed lowerer exactly as `start` does by default.
pub fn check(source: &str) -> Result<(), ValidationError> {
    prepare(source, true).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_accepts_valid_document() {
        assert!(check("# prompt: greet\nhello").is_ok());
    }

    #[test]
    fn test_check_accepts_relaxed_syntax() {
        assert!(check("# pre: a\nset('x', 1)\n# prompt: a\nhi").is_ok());
    }

    #[test]
    fn test_check_rejects_reserved_identifier() {
        let err = check("# prompt: return\nhi").unwrap_err();
        assert_eq!(err.to_string(), "Reserved step identifier: return");
    }

    #[tokio::test]
    async fn test_start_propagates_validation_errors() {
        let err = start("# prompt: return\nhi", RunOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_start_runs_to_completion() {
        let ctx = start("# prompt: greet\nhello", RunOptions::new())
            .await
            .unwrap();
        assert_eq!(ctx.result_text, "hello");
    }

    #[tokio::test]
    async fn test_relaxed_disabled_leaves_sugar_unlowered() {
        // With the lowerer off, the sugar line is plain text and renders as-is
        let ctx = start(
            "# prompt: a\nhi\n# post: a\nset('x', 1)",
            RunOptions::new().relaxed(false),
        )
        .await
        .unwrap();
        assert_eq!(ctx.get_value("x"), None);
    }
}
