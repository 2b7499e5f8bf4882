//! In-memory implementation of the store and change-feed ports.
//!
//! Backs the engine in tests and single-process operation. Mutations emit
//! change events on a broadcast channel; subscriptions filter by scope.
//!
//! # Panics
//!
//! Methods may panic if internal locks are poisoned. This is acceptable
//! for test-scope code; deployments integrate a real durable store behind
//! the same ports.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::DEFAULT_CHANGE_BUFFER;
use crate::domain::foundation::{ParticipantId, SessionId, StoreError, StoryId, Timestamp};
use crate::domain::session::Session;
use crate::domain::story::Story;
use crate::domain::voting::Vote;
use crate::ports::{
    ChangeEvent, ChangeKind, ChangeScope, ChangeStream, EstimationStore, StoreChangeFeed,
    SubscriptionError,
};

/// Which table a change belongs to, for scope filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangedTable {
    Stories,
    Votes,
}

#[derive(Debug, Clone, Copy)]
struct BroadcastChange {
    table: ChangedTable,
    event: ChangeEvent,
}

/// In-memory durable store with a broadcast change feed.
pub struct InMemoryEstimationStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    stories: RwLock<Vec<Story>>,
    votes: RwLock<Vec<Vote>>,
    participants: RwLock<Vec<(SessionId, ParticipantId)>>,
    changes: broadcast::Sender<BroadcastChange>,
}

impl InMemoryEstimationStore {
    /// Creates an empty store with the default change-feed buffer.
    pub fn new() -> Self {
        Self::with_change_buffer(DEFAULT_CHANGE_BUFFER)
    }

    /// Creates an empty store with an explicit change-feed buffer
    /// capacity.
    pub fn with_change_buffer(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity);
        Self {
            sessions: RwLock::new(HashMap::new()),
            stories: RwLock::new(Vec::new()),
            votes: RwLock::new(Vec::new()),
            participants: RwLock::new(Vec::new()),
            changes,
        }
    }

    fn emit(&self, table: ChangedTable, kind: ChangeKind, session_id: SessionId) {
        // Send fails only when no subscriber is listening
        let _ = self.changes.send(BroadcastChange {
            table,
            event: ChangeEvent { kind, session_id },
        });
    }

    fn session_of_story(&self, story_id: &StoryId) -> Option<SessionId> {
        self.stories
            .read()
            .expect("InMemoryEstimationStore: stories lock poisoned")
            .iter()
            .find(|story| story.id() == story_id)
            .map(|story| *story.session_id())
    }
}

impl Default for InMemoryEstimationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EstimationStore for InMemoryEstimationStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .expect("InMemoryEstimationStore: sessions write lock poisoned");
        if sessions.contains_key(session.id()) {
            return Err(StoreError::new(format!(
                "duplicate session id: {}",
                session.id()
            )));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .expect("InMemoryEstimationStore: sessions lock poisoned")
            .get(id)
            .cloned())
    }

    async fn end_session(&self, id: &SessionId, ended_at: Timestamp) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .expect("InMemoryEstimationStore: sessions write lock poisoned");
        // Like an UPDATE matching zero rows, an unknown id is a no-op
        if let Some(session) = sessions.get_mut(id) {
            session.end(ended_at);
        }
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let removed = self
            .sessions
            .write()
            .expect("InMemoryEstimationStore: sessions write lock poisoned")
            .remove(id)
            .is_some();

        if removed {
            // Cascade: stories and votes under the session go with it
            let removed_stories: Vec<StoryId> = {
                let mut stories = self
                    .stories
                    .write()
                    .expect("InMemoryEstimationStore: stories write lock poisoned");
                let doomed: Vec<StoryId> = stories
                    .iter()
                    .filter(|story| story.session_id() == id)
                    .map(|story| *story.id())
                    .collect();
                stories.retain(|story| story.session_id() != id);
                doomed
            };

            self.votes
                .write()
                .expect("InMemoryEstimationStore: votes write lock poisoned")
                .retain(|vote| !removed_stories.contains(&vote.story_id));

            self.participants
                .write()
                .expect("InMemoryEstimationStore: participants write lock poisoned")
                .retain(|(session_id, _)| session_id != id);

            if !removed_stories.is_empty() {
                self.emit(ChangedTable::Stories, ChangeKind::Delete, *id);
            }
        }
        Ok(())
    }

    async fn list_active_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let mut active: Vec<Session> = self
            .sessions
            .read()
            .expect("InMemoryEstimationStore: sessions lock poisoned")
            .values()
            .filter(|session| session.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(active)
    }

    async fn insert_story(&self, story: &Story) -> Result<(), StoreError> {
        if !self
            .sessions
            .read()
            .expect("InMemoryEstimationStore: sessions lock poisoned")
            .contains_key(story.session_id())
        {
            return Err(StoreError::new(format!(
                "session not found: {}",
                story.session_id()
            )));
        }

        self.stories
            .write()
            .expect("InMemoryEstimationStore: stories write lock poisoned")
            .push(story.clone());
        self.emit(ChangedTable::Stories, ChangeKind::Insert, *story.session_id());
        Ok(())
    }

    async fn list_stories(&self, session_id: &SessionId) -> Result<Vec<Story>, StoreError> {
        // Insertion order is creation order
        Ok(self
            .stories
            .read()
            .expect("InMemoryEstimationStore: stories lock poisoned")
            .iter()
            .filter(|story| story.session_id() == session_id)
            .cloned()
            .collect())
    }

    async fn set_final_estimate(&self, story_id: &StoryId, points: u32) -> Result<(), StoreError> {
        let session_id = {
            let mut stories = self
                .stories
                .write()
                .expect("InMemoryEstimationStore: stories write lock poisoned");
            let story = stories
                .iter_mut()
                .find(|story| story.id() == story_id)
                .ok_or_else(|| StoreError::new(format!("story not found: {}", story_id)))?;

            // Plain column update: last write wins, no set-once check here
            let replacement = Story::reconstitute(
                *story.id(),
                *story.session_id(),
                story.title().to_string(),
                story.description().to_string(),
                story.suggested_estimate(),
                Some(points),
                *story.created_at(),
            );
            let session_id = *replacement.session_id();
            *story = replacement;
            session_id
        };

        self.emit(ChangedTable::Stories, ChangeKind::Update, session_id);
        Ok(())
    }

    async fn upsert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let session_id = self
            .session_of_story(&vote.story_id)
            .ok_or_else(|| StoreError::new(format!("story not found: {}", vote.story_id)))?;

        let kind = {
            let mut votes = self
                .votes
                .write()
                .expect("InMemoryEstimationStore: votes write lock poisoned");
            match votes.iter_mut().find(|existing| {
                existing.story_id == vote.story_id
                    && existing.participant_id == vote.participant_id
            }) {
                Some(existing) => {
                    existing.estimate = vote.estimate;
                    ChangeKind::Update
                }
                None => {
                    votes.push(*vote);
                    ChangeKind::Insert
                }
            }
        };

        self.emit(ChangedTable::Votes, kind, session_id);
        Ok(())
    }

    async fn list_votes(&self, story_id: &StoryId) -> Result<Vec<Vote>, StoreError> {
        Ok(self
            .votes
            .read()
            .expect("InMemoryEstimationStore: votes lock poisoned")
            .iter()
            .filter(|vote| vote.story_id == *story_id)
            .copied()
            .collect())
    }

    async fn upsert_participant(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> Result<(), StoreError> {
        let mut participants = self
            .participants
            .write()
            .expect("InMemoryEstimationStore: participants write lock poisoned");
        let pair = (*session_id, *participant_id);
        if !participants.contains(&pair) {
            participants.push(pair);
        }
        Ok(())
    }

    async fn list_participants(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<ParticipantId>, StoreError> {
        Ok(self
            .participants
            .read()
            .expect("InMemoryEstimationStore: participants lock poisoned")
            .iter()
            .filter(|(owner, _)| owner == session_id)
            .map(|(_, participant)| *participant)
            .collect())
    }
}

#[async_trait]
impl StoreChangeFeed for InMemoryEstimationStore {
    async fn subscribe(&self, scope: ChangeScope) -> Result<ChangeStream, SubscriptionError> {
        let receiver = self.changes.subscribe();
        Ok(scoped_stream(receiver, scope))
    }
}

fn scoped_stream(receiver: broadcast::Receiver<BroadcastChange>, scope: ChangeScope) -> ChangeStream {
    Box::pin(stream::unfold(receiver, move |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) if matches_scope(&change, &scope) => {
                    return Some((change.event, receiver))
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // The next delivered event triggers a full re-fetch, so
                    // skipped notifications are coalesced, not lost
                    debug!(skipped, "change feed lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }))
}

fn matches_scope(change: &BroadcastChange, scope: &ChangeScope) -> bool {
    match scope {
        ChangeScope::Stories { session_id } => {
            change.table == ChangedTable::Stories && change.event.session_id == *session_id
        }
        ChangeScope::Votes { session_id } => {
            change.table == ChangedTable::Votes && change.event.session_id == *session_id
        }
    }
}
