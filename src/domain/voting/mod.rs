//! Vote ledger and consensus aggregation.

mod consensus;
mod ledger;

pub use consensus::{analyze, ConsensusReport};
pub use ledger::VoteLedger;

use crate::domain::foundation::{Estimate, ParticipantId, StoryId};
use serde::{Deserialize, Serialize};

/// One participant's recorded estimate for one story, as the store keeps
/// it. Unique per `(story_id, participant_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub story_id: StoryId,
    pub participant_id: ParticipantId,
    pub estimate: Estimate,
}
