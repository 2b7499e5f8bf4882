//! Estimate value object and the estimation scale.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The ordered scale stories are pointed on.
pub const ESTIMATION_SCALE: [u32; 7] = [1, 2, 3, 5, 8, 13, 21];

/// A participant's estimate for one story.
///
/// Zero is the "unknown" marker: a valid vote that stays visible in the
/// ledger but is excluded from every aggregate statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Estimate(u32);

impl Estimate {
    /// The "unknown" marker vote.
    pub const UNKNOWN: Estimate = Estimate(0);

    /// Creates an estimate of the given point value.
    pub fn new(points: u32) -> Self {
        Self(points)
    }

    /// Returns the point value.
    pub fn points(&self) -> u32 {
        self.0
    }

    /// Whether this is the "unknown" marker.
    pub fn is_unknown(&self) -> bool {
        self.0 == 0
    }

    /// Whether this vote participates in mean/mode/consensus statistics.
    pub fn counts_toward_consensus(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "?")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Snaps a raw score to the nearest scale member by absolute distance.
///
/// A candidate replaces the current winner only when strictly closer, so
/// ties resolve toward the earlier (smaller) member.
pub fn snap_to_scale(score: u32) -> u32 {
    let mut nearest = ESTIMATION_SCALE[0];
    for candidate in ESTIMATION_SCALE {
        if candidate.abs_diff(score) < nearest.abs_diff(score) {
            nearest = candidate;
        }
    }
    nearest
}
