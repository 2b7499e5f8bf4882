//! Locally-materialized session state.
//!
//! The local view is a read-through cache of the durable store for the
//! active session only. It is rebuilt wholesale on refresh and never
//! partially trusted across a session switch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::foundation::{SessionId, StoryId};
use crate::domain::story::Story;
use crate::domain::voting::VoteLedger;

use super::observer::{StateChange, StateObserver};

/// The client's local view of the active session.
#[derive(Debug, Default)]
pub(crate) struct LocalState {
    /// The session currently synchronized to this client, if any.
    pub active_session: Option<SessionId>,

    /// Stories in creation order - the canonical display order.
    pub stories: Vec<Story>,

    /// Vote ledgers keyed by story.
    pub ledgers: HashMap<StoryId, VoteLedger>,
}

/// State shared between the client and the synchronization engine.
///
/// The generation counter fences stale asynchronous work: every activation
/// and deactivation bumps it, and a fetch started under an older
/// generation is discarded instead of applied.
pub(crate) struct SharedState {
    state: RwLock<LocalState>,
    observers: RwLock<Vec<Arc<dyn StateObserver>>>,
    generation: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LocalState::default()),
            observers: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// The current state generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Bump the generation, invalidating in-flight fetches.
    pub fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read access to the local state.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, LocalState> {
        self.state.read().await
    }

    /// Apply a mutation unconditionally and notify observers.
    pub async fn apply<F>(&self, change: StateChange, mutate: F)
    where
        F: FnOnce(&mut LocalState),
    {
        {
            let mut state = self.state.write().await;
            mutate(&mut state);
        }
        self.notify(&change).await;
    }

    /// Apply a mutation only when the generation still matches.
    ///
    /// Returns `false` when the result was stale and discarded.
    pub async fn apply_if_current<F>(&self, generation: u64, change: StateChange, mutate: F) -> bool
    where
        F: FnOnce(&mut LocalState),
    {
        {
            let mut state = self.state.write().await;
            if self.generation() != generation {
                debug!(
                    expected = generation,
                    current = self.generation(),
                    "discarding stale state update"
                );
                return false;
            }
            mutate(&mut state);
        }
        self.notify(&change).await;
        true
    }

    /// Register a listener for state changes.
    pub async fn register_observer(&self, observer: Arc<dyn StateObserver>) {
        self.observers.write().await.push(observer);
    }

    async fn notify(&self, change: &StateChange) {
        let observers = self.observers.read().await.clone();
        for observer in observers {
            observer.on_change(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingObserver {
        seen: Mutex<Vec<StateChange>>,
    }

    impl RecordingObserver {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<StateChange> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl StateObserver for RecordingObserver {
        fn on_change(&self, change: &StateChange) {
            self.seen.lock().unwrap().push(*change);
        }

        fn name(&self) -> &'static str {
            "RecordingObserver"
        }
    }

    #[tokio::test]
    async fn apply_mutates_and_notifies() {
        let shared = SharedState::new();
        let observer = Arc::new(RecordingObserver::new());
        shared.register_observer(observer.clone()).await;

        let session_id = SessionId::new();
        shared
            .apply(StateChange::SessionActivated(session_id), |state| {
                state.active_session = Some(session_id);
            })
            .await;

        assert_eq!(shared.read().await.active_session, Some(session_id));
        assert_eq!(observer.seen(), vec![StateChange::SessionActivated(session_id)]);
    }

    #[tokio::test]
    async fn stale_generation_is_discarded_without_notifying() {
        let shared = SharedState::new();
        let observer = Arc::new(RecordingObserver::new());
        shared.register_observer(observer.clone()).await;

        let stale = shared.advance_generation();
        shared.advance_generation();

        let applied = shared
            .apply_if_current(stale, StateChange::StoriesReplaced, |state| {
                state.active_session = Some(SessionId::new());
            })
            .await;

        assert!(!applied);
        assert_eq!(shared.read().await.active_session, None);
        assert!(observer.seen().is_empty());
    }

    #[tokio::test]
    async fn current_generation_applies() {
        let shared = SharedState::new();
        let generation = shared.advance_generation();

        let applied = shared
            .apply_if_current(generation, StateChange::VotesRefreshed, |state| {
                state.ledgers.insert(StoryId::new(), VoteLedger::new());
            })
            .await;

        assert!(applied);
        assert_eq!(shared.read().await.ledgers.len(), 1);
    }
}
