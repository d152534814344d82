//! Parse-time validation errors

use thiserror::Error;

/// Raised when a document fails static validation
///
/// Validation runs before execution; a run is never started on an invalid
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid step identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Reserved step identifier: return")]
    ReservedIdentifier,

    #[error("Duplicate step identifier: {0}")]
    DuplicateStep(String),

    #[error("Duplicate {phase} phase for step: {identifier}")]
    DuplicatePhase { phase: &'static str, identifier: String },

    #[error("Invalid step heading: {0}")]
    InvalidHeading(String),

    #[error("Step '{0}' missing required prompt phase")]
    MissingPrompt(String),

    #[error("Reserved variable: {0}")]
    ReservedVariable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_rule() {
        assert_eq!(
            ValidationError::ReservedIdentifier.to_string(),
            "Reserved step identifier: return"
        );
        assert_eq!(
            ValidationError::DuplicateStep("plan".into()).to_string(),
            "Duplicate step identifier: plan"
        );
        assert_eq!(
            ValidationError::MissingPrompt("plan".into()).to_string(),
            "Step 'plan' missing required prompt phase"
        );
    }
}
