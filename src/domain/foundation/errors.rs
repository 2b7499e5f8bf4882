//! Error types for the estimation domain.

use thiserror::Error;

/// Errors that occur while validating command input, raised before any
/// store effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' is not a valid identifier: '{value}'")]
    InvalidIdentifier { field: String, value: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an invalid identifier validation error.
    pub fn invalid_identifier(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::InvalidIdentifier {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Failure reported by the external durable store.
///
/// Carries the store's human-readable message verbatim; the core
/// propagates it without interpreting internals and never retries
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Store error: {message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Wraps a store failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the store's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("title");
        assert_eq!(format!("{}", err), "Field 'title' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_identifier_displays_correctly() {
        let err = ValidationError::invalid_identifier("story_id", "abc");
        assert_eq!(
            format!("{}", err),
            "Field 'story_id' is not a valid identifier: 'abc'"
        );
    }

    #[test]
    fn store_error_carries_message_verbatim() {
        let err = StoreError::new("connection refused");
        assert_eq!(err.message(), "connection refused");
        assert_eq!(format!("{}", err), "Store error: connection refused");
    }
}
