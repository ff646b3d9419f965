//! Domain error model.

use thiserror::Error;

use crate::field::OrderField;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures of the order wizard (missing
/// fields, illegal step transitions, malformed codes). Host bridge and
/// transport failures belong to the submission layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field required on the current product path is empty or missing.
    #[error("validation failed: `{field}` is required")]
    Validation { field: OrderField },

    /// A free-text field holds content the shop does not accept.
    #[error("content rejected: `{field}` contains inappropriate language")]
    Rejected { field: OrderField },

    /// The requested step transition is not allowed from the current state.
    #[error("invalid transition: cannot {action} while in {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    /// An internal code could not be parsed (e.g. unknown product code).
    #[error("invalid code: {0}")]
    InvalidCode(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(field: OrderField) -> Self {
        Self::Validation { field }
    }

    pub fn rejected(field: OrderField) -> Self {
        Self::Rejected { field }
    }

    pub fn invalid_transition(state: &'static str, action: &'static str) -> Self {
        Self::InvalidTransition { state, action }
    }

    pub fn invalid_code(msg: impl Into<String>) -> Self {
        Self::InvalidCode(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// The field that failed validation or was rejected.
    pub fn field(&self) -> Option<OrderField> {
        match self {
            DomainError::Validation { field } | DomainError::Rejected { field } => Some(*field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_the_field() {
        let err = DomainError::validation(OrderField::CustomDescription);
        assert_eq!(err.field(), Some(OrderField::CustomDescription));
        assert_eq!(
            err.to_string(),
            "validation failed: `customDescription` is required"
        );
    }

    #[test]
    fn rejected_content_names_the_field() {
        let err = DomainError::rejected(OrderField::CustomDescription);
        assert_eq!(err.field(), Some(OrderField::CustomDescription));
        assert!(err.to_string().starts_with("content rejected"));
    }

    #[test]
    fn transition_error_has_no_field() {
        let err = DomainError::invalid_transition("Submitting", "advance");
        assert_eq!(err.field(), None);
        assert_eq!(
            err.to_string(),
            "invalid transition: cannot advance while in Submitting"
        );
    }
}
