//! Search engines: Simulated Annealing, Whale Optimization, and their
//! Hybrid composition.
//!
//! Each engine implements the same [`Optimizer`] capability rather than
//! being driven through runtime duck-typing; [`hybrid::HybridEngine`]
//! composes a [`woa::WoaEngine`] with a greedy SA-style local
//! refinement step, holding the sub-engine directly rather than
//! reaching for it dynamically.

pub mod hybrid;
pub mod sa;
pub mod woa;

use crate::history::History;
use crate::moves::Move;
use crate::objective::CostRecord;
use crate::problem::Problem;
use crate::rng::RngSource;
use crate::timeline::Milestone;
use crate::Encoding;
use std::sync::atomic::AtomicBool;

/// A schedule search capability: run to completion (or to cancellation)
/// and report the best schedule found plus the iteration history.
pub trait Optimizer {
    fn optimize(&mut self, cancel: &AtomicBool) -> OptimizeResult;
}

/// The terminal output of any engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeResult {
    pub best_schedule: Encoding,
    pub best_cost: CostRecord,
    pub best_milestones: Vec<Milestone>,
    pub history: History,
}

/// Attempt budget handed to `lookahead_insertion` whenever an engine
/// samples it from the exploit/shrink move set.
pub(crate) const LOOKAHEAD_ATTEMPTS: usize = 5;

/// `{random_move, regenerate, inter_machine_swap, intra_machine_swap,
/// shuffle_machine}`, as named in the explore-set.
pub(crate) fn sample_explore_move(problem: &Problem, rng: &mut RngSource) -> Move {
    match rng.uniform_usize(5) {
        0 => Move::RandomMove,
        1 => Move::Regenerate,
        2 => Move::InterMachineSwap,
        3 => Move::IntraMachineSwap,
        _ => {
            let n_machines = problem.n_machines().max(1);
            Move::ShuffleMachine(1 + rng.uniform_usize(n_machines))
        }
    }
}

/// `{intra_machine_swap, inter_machine_swap, lookahead_insertion}`, used
/// both as SA's exploit set and WOA's shrinking-encircle move set.
pub(crate) fn sample_exploit_move(rng: &mut RngSource) -> Move {
    match rng.uniform_usize(3) {
        0 => Move::IntraMachineSwap,
        1 => Move::InterMachineSwap,
        _ => Move::LookaheadInsertion(LOOKAHEAD_ATTEMPTS),
    }
}

/// A well-formed empty result for a problem with no tasks or no
/// machines: an empty schedule, zero cost, no history.
pub(crate) fn empty_result(problem: &Problem) -> OptimizeResult {
    OptimizeResult {
        best_schedule: problem.empty_encoding(),
        best_cost: CostRecord {
            total: 0.0,
            makespan: 0.0,
            load_std: 0.0,
            precedence_penalty: 0.0,
            energy_overshoot: 0.0,
        },
        best_milestones: Vec::new(),
        history: History::default(),
    }
}
