//! Synchronization engine.
//!
//! Keeps local story and vote state for the active session eventually
//! consistent with the durable store: one full seed fetch on activation,
//! then a wholesale re-fetch on every change notification. At most one
//! pair of subscriptions is live per client; activating a new session
//! tears the previous pair down first.
//!
//! No ordering is guaranteed between the story and vote streams. Each
//! notification triggers a full snapshot read, so intermediate states may
//! be coalesced; the contract is eventual full consistency with bounded
//! staleness, not event-by-event replay.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::foundation::{SessionId, StoreError, StoryId};
use crate::domain::voting::VoteLedger;
use crate::ports::{ChangeScope, EstimationStore, StoreChangeFeed};

use super::observer::StateChange;
use super::state::SharedState;

/// Realtime delivery status after activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Both change subscriptions are live.
    Realtime,

    /// A subscription could not be established. Local state still seeded
    /// and can be kept current through manual refresh.
    Degraded,
}

/// Owns the subscription lifecycle for the active session.
pub(crate) struct SyncEngine {
    store: Arc<dyn EstimationStore>,
    feed: Arc<dyn StoreChangeFeed>,
    shared: Arc<SharedState>,
    subscriptions: Option<LiveSubscriptions>,
}

struct LiveSubscriptions {
    session_id: SessionId,
    story_task: JoinHandle<()>,
    vote_task: JoinHandle<()>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn EstimationStore>,
        feed: Arc<dyn StoreChangeFeed>,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            store,
            feed,
            shared,
            subscriptions: None,
        }
    }

    /// Activate synchronization for a session.
    ///
    /// Tears down any previous subscription pair, resets local state,
    /// seeds it with a full fetch, then opens the story and vote
    /// subscriptions.
    ///
    /// # Errors
    ///
    /// - `StoreError` when the seed fetch fails; the session stays active
    ///   and a later `refresh` can complete the seeding
    pub async fn activate(&mut self, session_id: SessionId) -> Result<SyncStatus, StoreError> {
        self.teardown();
        let generation = self.shared.advance_generation();

        self.shared
            .apply(StateChange::SessionActivated(session_id), |state| {
                state.active_session = Some(session_id);
                state.stories.clear();
                state.ledgers.clear();
            })
            .await;

        refresh_stories(&self.store, &self.shared, session_id, generation).await?;
        refresh_votes(&self.store, &self.shared, generation).await?;

        let story_stream = self.feed.subscribe(ChangeScope::Stories { session_id }).await;
        let vote_stream = self.feed.subscribe(ChangeScope::Votes { session_id }).await;

        let (story_stream, vote_stream) = match (story_stream, vote_stream) {
            (Ok(stories), Ok(votes)) => (stories, votes),
            (stories, votes) => {
                if let Err(err) = &stories {
                    warn!(%session_id, error = %err, "story subscription failed");
                }
                if let Err(err) = &votes {
                    warn!(%session_id, error = %err, "vote subscription failed");
                }
                return Ok(SyncStatus::Degraded);
            }
        };

        let story_task = {
            let store = Arc::clone(&self.store);
            let shared = Arc::clone(&self.shared);
            let mut stream = story_stream;
            tokio::spawn(async move {
                while let Some(event) = stream.next().await {
                    debug!(session_id = %event.session_id, kind = ?event.kind, "story change notification");
                    if let Err(err) = refresh_stories(&store, &shared, session_id, generation).await
                    {
                        warn!(error = %err, "story refresh failed; local view may be stale");
                    }
                }
                debug!(%session_id, "story subscription stream closed");
            })
        };

        let vote_task = {
            let store = Arc::clone(&self.store);
            let shared = Arc::clone(&self.shared);
            let mut stream = vote_stream;
            tokio::spawn(async move {
                while let Some(event) = stream.next().await {
                    debug!(session_id = %event.session_id, kind = ?event.kind, "vote change notification");
                    if let Err(err) = refresh_votes(&store, &shared, generation).await {
                        warn!(error = %err, "vote refresh failed; local view may be stale");
                    }
                }
                debug!(%session_id, "vote subscription stream closed");
            })
        };

        self.subscriptions = Some(LiveSubscriptions {
            session_id,
            story_task,
            vote_task,
        });
        Ok(SyncStatus::Realtime)
    }

    /// Deactivate: tear down subscriptions and clear local state.
    pub async fn deactivate(&mut self) {
        self.teardown();
        self.shared.advance_generation();
        self.shared
            .apply(StateChange::SessionDeactivated, |state| {
                state.active_session = None;
                state.stories.clear();
                state.ledgers.clear();
            })
            .await;
    }

    /// Whether a subscription pair is currently live.
    pub fn has_live_subscriptions(&self) -> bool {
        self.subscriptions.is_some()
    }

    fn teardown(&mut self) {
        if let Some(subscriptions) = self.subscriptions.take() {
            subscriptions.story_task.abort();
            subscriptions.vote_task.abort();
            debug!(session_id = %subscriptions.session_id, "subscriptions torn down");
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Re-fetch the full story list and replace local state wholesale.
///
/// Ledgers for stories that disappeared are dropped. Returns `false` when
/// the result was stale and discarded.
pub(crate) async fn refresh_stories(
    store: &Arc<dyn EstimationStore>,
    shared: &Arc<SharedState>,
    session_id: SessionId,
    generation: u64,
) -> Result<bool, StoreError> {
    let stories = store.list_stories(&session_id).await?;
    Ok(shared
        .apply_if_current(generation, StateChange::StoriesReplaced, |state| {
            state
                .ledgers
                .retain(|story_id, _| stories.iter().any(|story| story.id() == story_id));
            state.stories = stories;
        })
        .await)
}

/// Re-fetch votes for every locally-known story and rebuild the ledgers.
///
/// Returns `false` when the result was stale and discarded.
pub(crate) async fn refresh_votes(
    store: &Arc<dyn EstimationStore>,
    shared: &Arc<SharedState>,
    generation: u64,
) -> Result<bool, StoreError> {
    let story_ids: Vec<StoryId> = {
        let state = shared.read().await;
        state.stories.iter().map(|story| *story.id()).collect()
    };

    let mut rebuilt: Vec<(StoryId, VoteLedger)> = Vec::with_capacity(story_ids.len());
    for story_id in story_ids {
        let votes = store.list_votes(&story_id).await?;
        let mut ledger = VoteLedger::new();
        for vote in votes {
            ledger.record(vote.participant_id, vote.estimate);
        }
        rebuilt.push((story_id, ledger));
    }

    Ok(shared
        .apply_if_current(generation, StateChange::VotesRefreshed, |state| {
            for (story_id, ledger) in rebuilt {
                state.ledgers.insert(story_id, ledger);
            }
        })
        .await)
}
