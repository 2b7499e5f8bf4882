//! Per-story vote ledger.
//!
//! Maps participants to their current estimate with at-most-one-live-vote
//! semantics: resubmission overwrites, votes are never retracted.

use crate::domain::foundation::{Estimate, ParticipantId};
use serde::{Deserialize, Serialize};

/// Participant → estimate mapping for a single story.
///
/// Entries keep their first-insertion position across overwrites, so
/// iteration order is stable for consensus aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteLedger {
    entries: Vec<(ParticipantId, Estimate)>,
}

impl VoteLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or overwrite the participant's estimate. Last write wins.
    pub fn record(&mut self, participant_id: ParticipantId, estimate: Estimate) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == participant_id)
        {
            Some(entry) => entry.1 = estimate,
            None => self.entries.push((participant_id, estimate)),
        }
    }

    /// The participant's current estimate, if they voted.
    pub fn estimate_for(&self, participant_id: &ParticipantId) -> Option<Estimate> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == participant_id)
            .map(|(_, estimate)| *estimate)
    }

    /// All entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &Estimate)> {
        self.entries.iter().map(|(participant, estimate)| (participant, estimate))
    }

    /// Number of recorded votes, unknown markers included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no votes have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_only_the_latest_estimate_per_participant() {
        let mut ledger = VoteLedger::new();
        let participant = ParticipantId::new();

        ledger.record(participant, Estimate::new(3));
        ledger.record(participant, Estimate::new(8));
        ledger.record(participant, Estimate::new(5));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.estimate_for(&participant), Some(Estimate::new(5)));
    }

    #[test]
    fn overwrite_preserves_first_insertion_order() {
        let mut ledger = VoteLedger::new();
        let first = ParticipantId::new();
        let second = ParticipantId::new();

        ledger.record(first, Estimate::new(3));
        ledger.record(second, Estimate::new(5));
        ledger.record(first, Estimate::new(8));

        let order: Vec<ParticipantId> = ledger.iter().map(|(p, _)| *p).collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn unknown_votes_are_recorded() {
        let mut ledger = VoteLedger::new();
        let participant = ParticipantId::new();

        ledger.record(participant, Estimate::UNKNOWN);

        assert_eq!(ledger.estimate_for(&participant), Some(Estimate::UNKNOWN));
    }

    #[test]
    fn estimate_for_unknown_participant_is_none() {
        let ledger = VoteLedger::new();
        assert_eq!(ledger.estimate_for(&ParticipantId::new()), None);
    }
}
