//! Client state container.
//!
//! The single in-process authority for what this participant currently
//! sees. All local mutations flow through here - user commands directly,
//! store notifications through the synchronization engine it owns. Reads
//! return snapshots of local state, which may be momentarily stale until
//! the next refresh completes.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::foundation::{
    Estimate, ParticipantId, SessionId, StoryId, Timestamp,
};
use crate::domain::session::{Session, DEFAULT_SESSION_NAME};
use crate::domain::story::Story;
use crate::domain::voting::{analyze, ConsensusReport, Vote, VoteLedger};
use crate::ports::{EstimationStore, StoreChangeFeed};

use super::errors::CommandError;
use super::observer::{StateChange, StateObserver};
use super::state::SharedState;
use super::sync::{refresh_stories, refresh_votes, SyncEngine, SyncStatus};

/// Client state container for one participant's process.
pub struct EstimationClient {
    store: Arc<dyn EstimationStore>,
    shared: Arc<SharedState>,
    sync: Mutex<SyncEngine>,
}

impl EstimationClient {
    /// Create a client over a store and its change feed.
    pub fn new(store: Arc<dyn EstimationStore>, feed: Arc<dyn StoreChangeFeed>) -> Self {
        let shared = Arc::new(SharedState::new());
        let sync = SyncEngine::new(Arc::clone(&store), feed, Arc::clone(&shared));
        Self {
            store,
            shared,
            sync: Mutex::new(sync),
        }
    }

    /// Register a listener for local-state changes.
    pub async fn register_observer(&self, observer: Arc<dyn StateObserver>) {
        self.shared.register_observer(observer).await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Create a new session.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name is blank
    /// - `Store` on persistence failure
    pub async fn create_session(
        &self,
        id: SessionId,
        created_by: ParticipantId,
        name: &str,
    ) -> Result<Session, CommandError> {
        let session = Session::new(id, created_by, name)?;
        self.store.insert_session(&session).await?;
        Ok(session)
    }

    /// Fetch a session by id. Returns `None` if not found.
    pub async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, CommandError> {
        Ok(self.store.get_session(id).await?)
    }

    /// Fetch a session, creating it with the default name when missing.
    pub async fn ensure_session(
        &self,
        id: SessionId,
        participant_id: ParticipantId,
    ) -> Result<Session, CommandError> {
        if let Some(session) = self.store.get_session(&id).await? {
            return Ok(session);
        }
        self.create_session(id, participant_id, DEFAULT_SESSION_NAME)
            .await
    }

    /// End a session. One-way: an ended session never becomes active
    /// again, and already-set final estimates are untouched.
    pub async fn end_session(&self, id: &SessionId) -> Result<(), CommandError> {
        self.store.end_session(id, Timestamp::now()).await?;
        Ok(())
    }

    /// Delete a session row entirely. Irreversible; dependent stories and
    /// votes are removed by the store's referential rules.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), CommandError> {
        self.store.delete_session(id).await?;
        Ok(())
    }

    /// Active sessions, newest first.
    ///
    /// Re-sorts locally in case the store's ordering cannot be trusted.
    pub async fn list_active_sessions(&self) -> Result<Vec<Session>, CommandError> {
        let mut sessions = self.store.list_active_sessions().await?;
        sessions.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(sessions)
    }

    /// Join a session. Idempotent: repeat joins are upserts.
    pub async fn join_session(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<(), CommandError> {
        self.store
            .upsert_participant(session_id, participant_id)
            .await?;
        Ok(())
    }

    /// Participants who joined a session.
    pub async fn participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ParticipantId>, CommandError> {
        Ok(self.store.list_participants(session_id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Synchronization lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Make a session the active one: seed local state and open change
    /// subscriptions. Any previously active session is deactivated first.
    ///
    /// A `Degraded` status means realtime delivery is unavailable; the
    /// client stays usable through [`refresh`](Self::refresh).
    pub async fn activate_session(
        &self,
        session_id: SessionId,
    ) -> Result<SyncStatus, CommandError> {
        let mut sync = self.sync.lock().await;
        Ok(sync.activate(session_id).await?)
    }

    /// Drop the active session: tear down subscriptions and clear local
    /// story and vote state.
    pub async fn deactivate_session(&self) {
        let mut sync = self.sync.lock().await;
        sync.deactivate().await;
    }

    /// Whether both change subscriptions are currently live.
    pub async fn has_live_subscriptions(&self) -> bool {
        self.sync.lock().await.has_live_subscriptions()
    }

    /// Manually re-fetch stories and votes for the active session.
    ///
    /// The escape hatch when realtime delivery is degraded.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` when nothing is activated
    /// - `Store` when a fetch fails
    pub async fn refresh(&self) -> Result<(), CommandError> {
        let (session_id, generation) = self.active_context().await?;
        refresh_stories(&self.store, &self.shared, session_id, generation).await?;
        refresh_votes(&self.store, &self.shared, generation).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Story queue
    // ─────────────────────────────────────────────────────────────────────

    /// Add a story to the active session.
    ///
    /// The suggested estimate is computed here, once. The new story is
    /// appended locally so creation order stays the display order.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` when nothing is activated
    /// - `Validation` if the title is blank
    /// - `Store` on persistence failure
    pub async fn add_story(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Story, CommandError> {
        let (session_id, generation) = self.active_context().await?;

        let story = Story::new(StoryId::new(), session_id, title, description)?;
        self.store.insert_story(&story).await?;

        let appended = story.clone();
        self.shared
            .apply_if_current(generation, StateChange::StoryAdded(*story.id()), |state| {
                state.ledgers.insert(*appended.id(), VoteLedger::new());
                state.stories.push(appended);
            })
            .await;
        Ok(story)
    }

    /// Submit or overwrite this participant's vote for a story.
    ///
    /// Identifiers arrive raw from the presentation layer and are
    /// validated locally; malformed ids never reach the store.
    ///
    /// # Errors
    ///
    /// - `Validation` on a malformed identifier
    /// - `Store` on persistence failure
    pub async fn submit_vote(
        &self,
        story_id: &str,
        participant_id: &str,
        estimate: Estimate,
    ) -> Result<(), CommandError> {
        let story_id = StoryId::parse(story_id)?;
        let participant_id = ParticipantId::parse(participant_id)?;

        let vote = Vote {
            story_id,
            participant_id,
            estimate,
        };
        self.store.upsert_vote(&vote).await?;

        let generation = self.shared.generation();
        self.shared
            .apply_if_current(generation, StateChange::VoteRecorded(story_id), |state| {
                if let Some(ledger) = state.ledgers.get_mut(&story_id) {
                    ledger.record(participant_id, estimate);
                }
            })
            .await;
        Ok(())
    }

    /// Commit a final estimate for a story.
    ///
    /// Set-once on this client: re-finalizing fails. The store write
    /// itself is last-write-wins, so finalizers on other clients race
    /// without a conflict signal.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` when nothing is activated
    /// - `StoryNotFound` if the story is not in local state
    /// - `Story` on a zero estimate or an already-finalized story
    /// - `Store` on persistence failure
    pub async fn finalize_story(
        &self,
        story_id: &StoryId,
        points: u32,
    ) -> Result<(), CommandError> {
        let (_, generation) = self.active_context().await?;

        let finalized = {
            let state = self.shared.read().await;
            let mut story = state
                .stories
                .iter()
                .find(|story| story.id() == story_id)
                .cloned()
                .ok_or(CommandError::StoryNotFound(*story_id))?;
            story.finalize(points)?;
            story
        };

        self.store.set_final_estimate(story_id, points).await?;

        let id = *story_id;
        self.shared
            .apply_if_current(generation, StateChange::StoryFinalized(id), |state| {
                if let Some(slot) = state.stories.iter_mut().find(|story| story.id() == &id) {
                    *slot = finalized;
                }
            })
            .await;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// The currently active session id, if any.
    pub async fn active_session(&self) -> Option<SessionId> {
        self.shared.read().await.active_session
    }

    /// Snapshot of the active session's stories in creation order.
    pub async fn stories(&self) -> Vec<Story> {
        self.shared.read().await.stories.clone()
    }

    /// Snapshot of the vote ledger for a story.
    pub async fn votes_for(&self, story_id: &StoryId) -> Option<VoteLedger> {
        self.shared.read().await.ledgers.get(story_id).cloned()
    }

    /// Consensus statistics for a story, recomputed from the current
    /// ledger snapshot on every call.
    ///
    /// # Errors
    ///
    /// - `StoryNotFound` if the story is not in local state
    pub async fn consensus_for(
        &self,
        story_id: &StoryId,
    ) -> Result<ConsensusReport, CommandError> {
        let state = self.shared.read().await;
        let story = state
            .stories
            .iter()
            .find(|story| story.id() == story_id)
            .ok_or(CommandError::StoryNotFound(*story_id))?;

        let empty = VoteLedger::new();
        let ledger = state.ledgers.get(story_id).unwrap_or(&empty);
        Ok(analyze(ledger, story.suggested_estimate()))
    }

    /// The active session id and current generation, or `NoActiveSession`.
    async fn active_context(&self) -> Result<(SessionId, u64), CommandError> {
        let state = self.shared.read().await;
        let generation = self.shared.generation();
        state
            .active_session
            .map(|id| (id, generation))
            .ok_or(CommandError::NoActiveSession)
    }
}
