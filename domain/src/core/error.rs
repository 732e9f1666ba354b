//! Domain error types

use crate::orchestration::cycle::CyclePhase;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid {kind}: {reason}")]
    InvalidIdentifier { kind: &'static str, reason: String },

    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("Illegal cycle transition: {from} -> {to}")]
    IllegalTransition { from: CyclePhase, to: CyclePhase },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identifier_display() {
        let error = DomainError::InvalidIdentifier {
            kind: "user id",
            reason: "contains whitespace".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid user id: contains whitespace");
    }

    #[test]
    fn test_illegal_transition_display() {
        let error = DomainError::IllegalTransition {
            from: CyclePhase::Routed,
            to: CyclePhase::Persisted,
        };
        assert_eq!(
            error.to_string(),
            "Illegal cycle transition: routed -> persisted"
        );
    }
}
