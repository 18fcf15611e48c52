//! WOA outer loop composed with greedy SA-style local refinement per
//! candidate.
//!
//! `HybridEngine` holds a concrete [`WoaConfig`] and drives
//! [`woa::run`] directly with a local-refinement closure, rather than
//! reaching for a `WoaEngine` through a trait object - the orchestrator
//! composes a concrete sub-engine, per the redesign note on polymorphic
//! engines.

use super::sa::SaConfig;
use super::woa::{self, WoaConfig};
use super::{sample_exploit_move, OptimizeResult, Optimizer};
use crate::moves::{apply, Move, MoveContext};
use crate::objective::{evaluate, CostRecord};
use crate::problem::Problem;
use crate::rng::RngSource;
use crate::timeline::build_timeline;
use crate::Encoding;
use std::sync::atomic::AtomicBool;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HybridConfig {
    pub woa: WoaConfig,
    pub sa_local_iters: usize,
}

impl HybridConfig {
    pub fn recommended(n_iterations: usize, weights: crate::objective::Weights, seed: u64) -> Self {
        HybridConfig {
            woa: WoaConfig::recommended(n_iterations, weights, seed),
            sa_local_iters: 5,
        }
    }
}

pub struct HybridEngine<'p> {
    problem: &'p Problem,
    config: HybridConfig,
}

impl<'p> HybridEngine<'p> {
    pub fn new(problem: &'p Problem, config: HybridConfig) -> Self {
        HybridEngine { problem, config }
    }
}

impl<'p> Optimizer for HybridEngine<'p> {
    fn optimize(&mut self, cancel: &AtomicBool) -> OptimizeResult {
        let sa_local_iters = self.config.sa_local_iters;
        woa::run(self.problem, &self.config.woa, cancel, move |problem, ctx, rng, candidate_encoding, candidate_cost| {
            local_refine(problem, ctx, rng, candidate_encoding, candidate_cost, sa_local_iters)
        })
    }
}

/// Applies up to `sa_local_iters` greedy `exploit` steps to a copy of
/// `candidate_encoding`. No temperature: a trial is kept only if it
/// strictly improves total cost, and the loop stops at the first trial
/// that doesn't. Returns `None` if no trial ever improved.
fn local_refine(
    problem: &Problem,
    ctx: &MoveContext,
    rng: &mut RngSource,
    candidate_encoding: &Encoding,
    candidate_cost: &CostRecord,
    sa_local_iters: usize,
) -> Option<(Encoding, Vec<crate::timeline::Milestone>, CostRecord)> {
    let mut current_encoding = candidate_encoding.clone();
    let mut current_cost = *candidate_cost;
    let mut current_milestones: Option<Vec<crate::timeline::Milestone>> = None;
    let mut improved = false;

    for _ in 0..sa_local_iters {
        let mv = sample_exploit_move(rng);
        let mut trial_encoding = apply(mv, &current_encoding, rng, ctx);
        if problem.has_precedences() {
            trial_encoding = apply(Move::PartialPrecedenceRepair, &trial_encoding, rng, ctx);
        }
        let trial_milestones = build_timeline(problem, &trial_encoding);
        let trial_cost = evaluate(problem, &trial_encoding, &trial_milestones, ctx.weights);

        if trial_cost.total < current_cost.total {
            current_encoding = trial_encoding;
            current_milestones = Some(trial_milestones);
            current_cost = trial_cost;
            improved = true;
        } else {
            break;
        }
    }

    improved.then(|| (current_encoding, current_milestones.unwrap(), current_cost))
}

/// Convenience for callers who just want recommended defaults applied
/// uniformly across SA, WOA, and Hybrid from one seed.
pub fn matching_sa_config(hybrid: &HybridConfig) -> SaConfig {
    SaConfig::recommended(hybrid.woa.n_iterations, hybrid.woa.weights, hybrid.woa.seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::Weights;
    use crate::problem::Task;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;

    fn setup_matters_problem() -> Problem {
        let tasks = vec![Task::new(vec![3.0], 0.0, 1.0), Task::new(vec![4.0], 0.0, 1.0)];
        let setups = vec![vec![0.0, 2.0], vec![5.0, 0.0]];
        Problem::new(tasks, 1, setups, BTreeMap::new(), None, None).unwrap()
    }

    #[test]
    fn hybrid_finds_the_lower_setup_order() {
        let problem = setup_matters_problem();
        let config = HybridConfig::recommended(60, Weights::recommended(), 42);
        let mut engine = HybridEngine::new(&problem, config);
        let cancel = AtomicBool::new(false);
        let result = engine.optimize(&cancel);
        assert_eq!(result.best_cost.makespan, 9.0);
    }

    #[test]
    fn same_seed_and_params_are_bit_identical_across_runs() {
        let problem = setup_matters_problem();
        let cancel = AtomicBool::new(false);
        let mut e1 = HybridEngine::new(&problem, HybridConfig::recommended(40, Weights::recommended(), 3));
        let r1 = e1.optimize(&cancel);
        let mut e2 = HybridEngine::new(&problem, HybridConfig::recommended(40, Weights::recommended(), 3));
        let r2 = e2.optimize(&cancel);
        assert_eq!(r1.best_cost, r2.best_cost);
        assert_eq!(r1.best_schedule, r2.best_schedule);
    }

    #[test]
    fn empty_problem_returns_well_formed_empty_result() {
        let problem = Problem::new(vec![], 1, vec![], BTreeMap::new(), None, None).unwrap();
        let config = HybridConfig::recommended(10, Weights::recommended(), 1);
        let mut engine = HybridEngine::new(&problem, config);
        let cancel = AtomicBool::new(false);
        let result = engine.optimize(&cancel);
        assert!(result.history.is_empty());
    }

    #[test]
    fn matching_sa_config_carries_over_iterations_weights_and_seed() {
        let hybrid = HybridConfig::recommended(40, Weights::recommended(), 7);
        let sa = matching_sa_config(&hybrid);
        assert_eq!(sa.n_iterations, hybrid.woa.n_iterations);
        assert_eq!(sa.seed, hybrid.woa.seed);
        assert_eq!(sa.weights, hybrid.woa.weights);
    }
}
