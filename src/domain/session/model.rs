//! Session entity.
//!
//! A session is a bounded planning event owning an ordered set of stories.
//!
//! # Invariants
//!
//! - `name` is non-empty after trimming
//! - `ended_at`, once set, never reverts to absent

use crate::domain::foundation::{ParticipantId, SessionId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

/// Name given to sessions created implicitly when a participant lands on
/// an unknown session id.
pub const DEFAULT_SESSION_NAME: &str = "Untitled Session";

/// Session entity - a bounded planning event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,

    /// Participant who created the session.
    created_by: ParticipantId,

    /// Display name.
    name: String,

    /// When the session was created.
    created_at: Timestamp,

    /// When the session was ended, if it has been.
    ended_at: Option<Timestamp>,
}

impl Session {
    /// Create a new active session.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the name is blank
    pub fn new(
        id: SessionId,
        created_by: ParticipantId,
        name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }

        Ok(Self {
            id,
            created_by,
            name,
            created_at: Timestamp::now(),
            ended_at: None,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    pub fn reconstitute(
        id: SessionId,
        created_by: ParticipantId,
        name: String,
        created_at: Timestamp,
        ended_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            created_by,
            name,
            created_at,
            ended_at,
        }
    }

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the creator's identity.
    pub fn created_by(&self) -> &ParticipantId {
        &self.created_by
    }

    /// Returns the session name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns when the session was created.
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Returns when the session was ended, if it has been.
    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    /// Whether the session is still running.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// End the session. One-way: the first `ended_at` is kept.
    ///
    /// Returns `false` when the session was already ended.
    pub fn end(&mut self, at: Timestamp) -> bool {
        if self.ended_at.is_some() {
            return false;
        }
        self.ended_at = Some(at);
        true
    }
}
