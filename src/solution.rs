//! The owned `{encoding, milestones, cost}` triple each engine/agent
//! carries, with an atomic update so a caller can never observe a cost
//! computed against a different encoding than the one it's paired with.

use crate::objective::CostRecord;
use crate::timeline::Milestone;
use crate::Encoding;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fully-scored candidate schedule. `Solution` is `Clone` so a
/// best-so-far can always be captured as a deep copy, never a shared
/// reference into a population.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    encoding: Encoding,
    milestones: Vec<Milestone>,
    cost: CostRecord,
}

impl Solution {
    pub fn new(encoding: Encoding, milestones: Vec<Milestone>, cost: CostRecord) -> Self {
        Solution {
            encoding,
            milestones,
            cost,
        }
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn cost(&self) -> &CostRecord {
        &self.cost
    }

    /// Replaces all three fields together. There is no setter for any
    /// single field, so a caller can never leave the triple
    /// inconsistent (a cost computed against a stale encoding).
    pub fn update(&mut self, encoding: Encoding, milestones: Vec<Milestone>, cost: CostRecord) {
        self.encoding = encoding;
        self.milestones = milestones;
        self.cost = cost;
    }
}
