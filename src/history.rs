//! Per-iteration search history, retained at a configurable level of
//! detail.
//!
//! The source retains a full population snapshot every iteration, which
//! gets memory-heavy for large `n_iterations * n_agents` runs. This
//! exposes the retention level as an explicit choice instead.

use crate::Encoding;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How much detail [`History`] retains per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HistoryMode {
    /// Every agent's full encoding every iteration. Diagnostic only -
    /// memory scales with `n_iterations * n_agents * n_tasks`.
    Full,
    /// Per-iteration cost figures only (current/best for SA, the cost
    /// distribution across agents for WOA/Hybrid), no encodings.
    #[default]
    Summary,
    /// Nothing retained beyond the final best.
    None,
}

/// One SA iteration's record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaEntry {
    pub iteration: usize,
    pub current_total: f64,
    pub best_total: f64,
}

/// One WOA/Hybrid iteration's record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WoaEntry {
    pub iteration: usize,
    pub agent_costs: Vec<f64>,
    /// Present only in [`HistoryMode::Full`].
    pub agent_encodings: Option<Vec<Encoding>>,
    pub best_total: f64,
}

/// The append-only record of a single engine run. Entries are pushed in
/// iteration order and never reordered or removed.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct History {
    mode: HistoryMode,
    sa: Vec<SaEntry>,
    woa: Vec<WoaEntry>,
}

impl History {
    pub fn new(mode: HistoryMode) -> Self {
        History {
            mode,
            sa: Vec::new(),
            woa: Vec::new(),
        }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    pub fn push_sa(&mut self, iteration: usize, current_total: f64, best_total: f64) {
        if self.mode == HistoryMode::None {
            return;
        }
        self.sa.push(SaEntry {
            iteration,
            current_total,
            best_total,
        });
    }

    pub fn push_woa(
        &mut self,
        iteration: usize,
        agent_costs: Vec<f64>,
        agent_encodings: Option<Vec<Encoding>>,
        best_total: f64,
    ) {
        if self.mode == HistoryMode::None {
            return;
        }
        let agent_encodings = match self.mode {
            HistoryMode::Full => agent_encodings,
            HistoryMode::Summary | HistoryMode::None => None,
        };
        self.woa.push(WoaEntry {
            iteration,
            agent_costs,
            agent_encodings,
            best_total,
        });
    }

    pub fn sa_entries(&self) -> &[SaEntry] {
        &self.sa
    }

    pub fn woa_entries(&self) -> &[WoaEntry] {
        &self.woa
    }

    pub fn len(&self) -> usize {
        self.sa.len() + self.woa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
