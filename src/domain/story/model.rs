//! Story entity.
//!
//! Stories belong to exactly one session. The suggested estimate is
//! computed once at creation and never recomputed; the final estimate is
//! set once and is terminal.

use crate::domain::foundation::{SessionId, StoryId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::suggestion::suggest;

/// Errors raised by story state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    /// The story already carries a final estimate.
    #[error("Story {id} is already finalized")]
    AlreadyFinalized { id: StoryId },

    /// A final estimate must be a positive integer.
    #[error("Final estimate must be positive, got {actual}")]
    InvalidEstimate { actual: u32 },
}

/// Story entity - a unit of work to be estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Unique identifier for this story.
    id: StoryId,

    /// Session this story belongs to.
    session_id: SessionId,

    /// Story title.
    title: String,

    /// Free-form description.
    description: String,

    /// Heuristic estimate computed at creation. Immutable.
    suggested_estimate: u32,

    /// Committed estimate, once the group decides.
    final_estimate: Option<u32>,

    /// When the story was created.
    created_at: Timestamp,
}

impl Story {
    /// Create a new story attached to a session.
    ///
    /// The suggested estimate is derived from the title and description
    /// here, exactly once.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the title is blank
    pub fn new(
        id: StoryId,
        session_id: SessionId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let description = description.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }

        let suggested_estimate = suggest(&title, &description);
        Ok(Self {
            id,
            session_id,
            title,
            description,
            suggested_estimate,
            final_estimate: None,
            created_at: Timestamp::now(),
        })
    }

    /// Reconstitute a story from persistence (no validation, no recompute).
    pub fn reconstitute(
        id: StoryId,
        session_id: SessionId,
        title: String,
        description: String,
        suggested_estimate: u32,
        final_estimate: Option<u32>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session_id,
            title,
            description,
            suggested_estimate,
            final_estimate,
            created_at,
        }
    }

    /// Returns the story ID.
    pub fn id(&self) -> &StoryId {
        &self.id
    }

    /// Returns the owning session's ID.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the story title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the story description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the heuristic estimate computed at creation.
    pub fn suggested_estimate(&self) -> u32 {
        self.suggested_estimate
    }

    /// Returns the committed estimate, if one is set.
    pub fn final_estimate(&self) -> Option<u32> {
        self.final_estimate
    }

    /// Returns when the story was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Whether a final estimate has been committed.
    pub fn is_finalized(&self) -> bool {
        self.final_estimate.is_some()
    }

    /// Commit the final estimate. Set-once: a second finalize fails.
    ///
    /// # Errors
    ///
    /// - `InvalidEstimate` if `points` is zero
    /// - `AlreadyFinalized` if a final estimate is already set
    pub fn finalize(&mut self, points: u32) -> Result<(), StoryError> {
        if points == 0 {
            return Err(StoryError::InvalidEstimate { actual: points });
        }
        if self.final_estimate.is_some() {
            return Err(StoryError::AlreadyFinalized { id: self.id });
        }

        self.final_estimate = Some(points);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_story() -> Story {
        Story::new(
            StoryId::new(),
            SessionId::new(),
            "Add OAuth support",
            "integration with the identity provider",
        )
        .unwrap()
    }

    #[test]
    fn new_story_computes_the_suggestion_once() {
        let story = Story::new(
            StoryId::new(),
            SessionId::new(),
            "Fix login bug",
            "simple quick fix",
        )
        .unwrap();
        assert_eq!(story.suggested_estimate(), 1);
    }

    #[test]
    fn new_story_rejects_empty_title() {
        let result = Story::new(StoryId::new(), SessionId::new(), "", "some description");
        assert!(result.is_err());
    }

    #[test]
    fn new_story_allows_empty_description() {
        let result = Story::new(StoryId::new(), SessionId::new(), "Tune cache", "");
        assert!(result.is_ok());
    }

    #[test]
    fn new_story_has_no_final_estimate() {
        let story = test_story();
        assert!(!story.is_finalized());
        assert_eq!(story.final_estimate(), None);
    }

    #[test]
    fn finalize_commits_the_estimate() {
        let mut story = test_story();
        story.finalize(5).unwrap();
        assert_eq!(story.final_estimate(), Some(5));
    }

    #[test]
    fn finalize_rejects_zero() {
        let mut story = test_story();
        let result = story.finalize(0);
        assert_eq!(result, Err(StoryError::InvalidEstimate { actual: 0 }));
        assert!(!story.is_finalized());
    }

    #[test]
    fn finalize_twice_fails_and_keeps_the_first_value() {
        let mut story = test_story();
        story.finalize(5).unwrap();

        let result = story.finalize(8);
        assert_eq!(result, Err(StoryError::AlreadyFinalized { id: *story.id() }));
        assert_eq!(story.final_estimate(), Some(5));
    }

    #[test]
    fn reconstitute_preserves_the_final_estimate() {
        let story = Story::reconstitute(
            StoryId::new(),
            SessionId::new(),
            "Migrate billing".to_string(),
            "".to_string(),
            8,
            Some(13),
            Timestamp::now(),
        );
        assert_eq!(story.suggested_estimate(), 8);
        assert_eq!(story.final_estimate(), Some(13));
    }
}
