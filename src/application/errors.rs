//! Command error taxonomy.

use thiserror::Error;

use crate::domain::foundation::{StoreError, StoryId, ValidationError};
use crate::domain::story::StoryError;

/// Errors returned to command issuers.
///
/// Validation failures reject synchronously before any store effect; store
/// failures surface the store's message without automatic retry. None of
/// these is fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Malformed input, rejected before any network effect.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A story-queue mutation was issued with no active session.
    #[error("No active session")]
    NoActiveSession,

    /// The story is not present in local state.
    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),

    /// A story state transition was rejected.
    #[error(transparent)]
    Story(#[from] StoryError),

    /// The external store rejected or could not complete an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert_transparently() {
        let err: CommandError = ValidationError::empty_field("title").into();
        assert_eq!(format!("{}", err), "Field 'title' cannot be empty");
    }

    #[test]
    fn store_errors_keep_their_message() {
        let err: CommandError = StoreError::new("timeout").into();
        assert_eq!(format!("{}", err), "Store error: timeout");
    }
}
