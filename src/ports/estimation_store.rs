//! Durable store port.
//!
//! Defines the contract for persisting sessions, stories, votes, and
//! participant records. The store is the single source of truth; local
//! state is a read-through cache rebuilt from these operations.
//!
//! # Design
//!
//! - **Opaque failures**: errors carry the store's human-readable message;
//!   callers propagate them without interpreting internals and never retry
//!   automatically
//! - **Conflict-keyed upserts**: votes and participant records overwrite on
//!   their natural keys instead of accumulating

use async_trait::async_trait;

use crate::domain::foundation::{ParticipantId, SessionId, StoreError, StoryId, Timestamp};
use crate::domain::session::Session;
use crate::domain::story::Story;
use crate::domain::voting::Vote;

/// Port for the external durable store.
///
/// Implementations must ensure:
/// - `list_active_sessions` excludes ended sessions and orders newest first
/// - `list_stories` preserves creation order
/// - `delete_session` removes dependent stories and votes through the
///   store's referential rules
#[async_trait]
pub trait EstimationStore: Send + Sync {
    /// Persist a new session.
    ///
    /// # Errors
    ///
    /// - `StoreError` on persistence failure or duplicate id
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Fetch a session by id.
    ///
    /// Returns `None` if not found.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Mark a session ended. Last write wins; the store never clears the
    /// value once set.
    async fn end_session(&self, id: &SessionId, ended_at: Timestamp) -> Result<(), StoreError>;

    /// Remove a session row entirely. Irreversible.
    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Sessions with no `ended_at`, newest first.
    async fn list_active_sessions(&self) -> Result<Vec<Session>, StoreError>;

    /// Persist a new story.
    async fn insert_story(&self, story: &Story) -> Result<(), StoreError>;

    /// All stories for a session in creation order.
    async fn list_stories(&self, session_id: &SessionId) -> Result<Vec<Story>, StoreError>;

    /// Set a story's final estimate. Last write wins: concurrent callers
    /// race with no conflict signal.
    async fn set_final_estimate(&self, story_id: &StoryId, points: u32) -> Result<(), StoreError>;

    /// Insert or overwrite one participant's vote for one story.
    async fn upsert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// All current votes for a story.
    async fn list_votes(&self, story_id: &StoryId) -> Result<Vec<Vote>, StoreError>;

    /// Record session membership; repeat joins are no-ops.
    async fn upsert_participant(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError>;

    /// Participants who joined a session.
    async fn list_participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ParticipantId>, StoreError>;
}
