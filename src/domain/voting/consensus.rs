//! Consensus aggregation over a vote ledger snapshot.
//!
//! Runs on demand; nothing here is cached. Unknown votes stay visible in
//! the ledger but are excluded from every statistic.

use super::VoteLedger;

/// Aggregate statistics for one story's votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusReport {
    /// Number of votes with a positive estimate.
    pub valid_votes: usize,

    /// Rounded mean of the valid votes; absent when none exist.
    pub mean: Option<u32>,

    /// Most frequent valid estimate. The first value to reach the winning
    /// frequency keeps precedence over later arrivals at the same
    /// frequency.
    pub mode: Option<u32>,

    /// Share of valid votes agreeing on the mode, as a whole percentage.
    /// Zero when no valid votes exist.
    pub consensus_ratio: u32,

    /// Finalization candidates in priority order: mode, mean when it
    /// differs from the mode, then the suggested estimate.
    pub candidates: Vec<u32>,
}

/// Derive consensus statistics from a ledger snapshot.
pub fn analyze(ledger: &VoteLedger, suggested_estimate: u32) -> ConsensusReport {
    let valid: Vec<u32> = ledger
        .iter()
        .map(|(_, estimate)| estimate.points())
        .filter(|points| *points > 0)
        .collect();

    let mean = if valid.is_empty() {
        None
    } else {
        let sum: u32 = valid.iter().sum();
        Some((f64::from(sum) / valid.len() as f64).round() as u32)
    };

    let mut mode = None;
    let mut winning_frequency = 0usize;
    let mut frequencies: Vec<(u32, usize)> = Vec::new();
    for points in &valid {
        let frequency = match frequencies.iter_mut().find(|(value, _)| value == points) {
            Some(entry) => {
                entry.1 += 1;
                entry.1
            }
            None => {
                frequencies.push((*points, 1));
                1
            }
        };
        if frequency > winning_frequency {
            winning_frequency = frequency;
            mode = Some(*points);
        }
    }

    let consensus_ratio = if valid.is_empty() {
        0
    } else {
        ((winning_frequency as f64 / valid.len() as f64) * 100.0).round() as u32
    };

    let mut candidates = Vec::new();
    if let Some(mode) = mode {
        candidates.push(mode);
    }
    if let Some(mean) = mean {
        if Some(mean) != mode {
            candidates.push(mean);
        }
    }
    candidates.push(suggested_estimate);

    ConsensusReport {
        valid_votes: valid.len(),
        mean,
        mode,
        consensus_ratio,
        candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Estimate, ParticipantId};

    fn ledger_of(points: &[u32]) -> VoteLedger {
        let mut ledger = VoteLedger::new();
        for value in points {
            ledger.record(ParticipantId::new(), Estimate::new(*value));
        }
        ledger
    }

    #[test]
    fn mean_rounds_to_the_nearest_integer() {
        let report = analyze(&ledger_of(&[3, 5, 8]), 5);
        assert_eq!(report.mean, Some(5));
    }

    #[test]
    fn empty_ledger_has_no_statistics() {
        let report = analyze(&VoteLedger::new(), 5);
        assert_eq!(report.valid_votes, 0);
        assert_eq!(report.mean, None);
        assert_eq!(report.mode, None);
        assert_eq!(report.consensus_ratio, 0);
        assert_eq!(report.candidates, vec![5]);
    }

    #[test]
    fn mode_picks_the_most_frequent_value() {
        let report = analyze(&ledger_of(&[3, 3, 5]), 8);
        assert_eq!(report.mode, Some(3));
        assert_eq!(report.consensus_ratio, 67);
    }

    #[test]
    fn mode_tie_goes_to_the_first_seen_value() {
        let report = analyze(&ledger_of(&[3, 5]), 8);
        assert_eq!(report.mode, Some(3));
        assert_eq!(report.consensus_ratio, 50);
    }

    #[test]
    fn first_value_to_reach_the_winning_frequency_keeps_it() {
        let report = analyze(&ledger_of(&[5, 3, 3, 5]), 8);
        assert_eq!(report.mode, Some(3));
    }

    #[test]
    fn unknown_votes_are_excluded_from_statistics() {
        let mut ledger = ledger_of(&[3, 3]);
        ledger.record(ParticipantId::new(), Estimate::UNKNOWN);

        let report = analyze(&ledger, 8);
        assert_eq!(report.valid_votes, 2);
        assert_eq!(report.mode, Some(3));
        assert_eq!(report.consensus_ratio, 100);
    }

    #[test]
    fn unanimous_votes_reach_full_consensus() {
        let report = analyze(&ledger_of(&[3, 3]), 8);
        assert_eq!(report.mode, Some(3));
        assert_eq!(report.consensus_ratio, 100);
    }

    #[test]
    fn candidates_are_mode_then_mean_then_suggestion() {
        // mode 3, mean round(11/3) = 4, suggested 8
        let report = analyze(&ledger_of(&[3, 3, 5]), 8);
        assert_eq!(report.candidates, vec![3, 4, 8]);
    }

    #[test]
    fn mean_equal_to_mode_is_not_offered_twice() {
        let report = analyze(&ledger_of(&[3, 3]), 8);
        assert_eq!(report.candidates, vec![3, 8]);
    }

    #[test]
    fn suggestion_is_always_a_candidate() {
        let report = analyze(&ledger_of(&[5, 5]), 5);
        assert_eq!(report.candidates, vec![5, 5]);
    }
}
