//! Change feed port.
//!
//! Row-level change notifications from the durable store. An event signals
//! that something changed; it carries no row payload. Consumers re-fetch
//! instead of patching, so delivery is at-least-once of *state*, not
//! exactly-once of individual mutations, and intermediate states may be
//! coalesced.

use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::SessionId;

/// Raised when a change subscription cannot be established.
///
/// Non-fatal: the client stays usable through manual refresh when realtime
/// delivery is degraded.
#[derive(Debug, Clone, Error)]
#[error("Subscription failed: {message}")]
pub struct SubscriptionError {
    message: String,
}

impl SubscriptionError {
    /// Wraps a subscription failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a subscription listens to. Always scoped to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeScope {
    /// Story-table mutations for the session.
    Stories { session_id: SessionId },

    /// Vote-table mutations for stories of the session.
    Votes { session_id: SessionId },
}

impl ChangeScope {
    /// The session this scope is bound to.
    pub fn session_id(&self) -> SessionId {
        match self {
            ChangeScope::Stories { session_id } | ChangeScope::Votes { session_id } => *session_id,
        }
    }
}

/// The kind of row mutation behind a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-change signal scoped to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub session_id: SessionId,
}

/// Stream of change events for one subscription. Dropping the stream tears
/// the subscription down.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

/// Port for subscribing to store change notifications.
#[async_trait]
pub trait StoreChangeFeed: Send + Sync {
    /// Open a subscription for the given scope.
    ///
    /// # Errors
    ///
    /// - `SubscriptionError` when the feed cannot be established
    async fn subscribe(&self, scope: ChangeScope) -> Result<ChangeStream, SubscriptionError>;
}
