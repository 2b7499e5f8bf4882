//! State change observation.
//!
//! Presentation and synchronization code registers listeners explicitly;
//! every local-state mutation publishes a change notification.

use crate::domain::foundation::{SessionId, StoryId};

/// A local-state mutation worth re-reading state for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// A session became the active one; local state was reset for it.
    SessionActivated(SessionId),

    /// The active session was dropped and local state cleared.
    SessionDeactivated,

    /// The story list was replaced from a store snapshot.
    StoriesReplaced,

    /// A story created on this client was appended.
    StoryAdded(StoryId),

    /// A vote submitted on this client was recorded.
    VoteRecorded(StoryId),

    /// Vote ledgers were rebuilt from a store snapshot.
    VotesRefreshed,

    /// A story's final estimate was committed on this client.
    StoryFinalized(StoryId),
}

/// Listener for local-state changes.
///
/// Implementations must be quick: notifications are delivered
/// synchronously from the mutating call.
pub trait StateObserver: Send + Sync {
    /// React to a state change.
    fn on_change(&self, change: &StateChange);

    /// Observer name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the trait is object-safe
    #[allow(dead_code)]
    fn assert_observer_object_safe(_: &dyn StateObserver) {}
}
