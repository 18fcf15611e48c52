//! Single-trajectory Simulated Annealing with exponential cooling.

use super::{empty_result, sample_exploit_move, sample_explore_move, OptimizeResult, Optimizer};
use crate::history::{History, HistoryMode};
use crate::moves::{apply, Move, MoveContext};
use crate::objective::{evaluate, Weights};
use crate::problem::Problem;
use crate::rng::RngSource;
use crate::solution::Solution;
use crate::timeline::build_timeline;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SA's tunable parameters. Every penalty weight is an explicit field -
/// never defaulted inside the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaConfig {
    pub n_iterations: usize,
    pub initial_temp: f64,
    pub alpha_cool: f64,
    pub explore_ratio: f64,
    pub weights: Weights,
    pub seed: u64,
    pub history_mode: HistoryMode,
}

impl SaConfig {
    /// The documented recommended defaults (`initial_temp = 1000`,
    /// `alpha_cool = 0.995`, `explore_ratio = 0.7`) for a given iteration
    /// budget, weights, and seed.
    pub fn recommended(n_iterations: usize, weights: Weights, seed: u64) -> Self {
        SaConfig {
            n_iterations,
            initial_temp: 1000.0,
            alpha_cool: 0.995,
            explore_ratio: 0.7,
            weights,
            seed,
            history_mode: HistoryMode::Summary,
        }
    }
}

pub struct SaEngine<'p> {
    problem: &'p Problem,
    config: SaConfig,
}

impl<'p> SaEngine<'p> {
    pub fn new(problem: &'p Problem, config: SaConfig) -> Self {
        SaEngine { problem, config }
    }
}

impl<'p> Optimizer for SaEngine<'p> {
    fn optimize(&mut self, cancel: &AtomicBool) -> OptimizeResult {
        let problem = self.problem;
        if problem.n_tasks() == 0 || problem.n_machines() == 0 {
            return empty_result(problem);
        }

        let mut rng = RngSource::new(self.config.seed);
        let ctx = MoveContext {
            problem,
            weights: &self.config.weights,
        };

        let initial_encoding = crate::moves::regenerate(problem, &mut rng);
        let initial_milestones = build_timeline(problem, &initial_encoding);
        let initial_cost = evaluate(problem, &initial_encoding, &initial_milestones, &ctx.weights);
        let mut current = Solution::new(initial_encoding, initial_milestones, initial_cost);
        let mut best = current.clone();

        let mut history = History::new(self.config.history_mode);
        let n = self.config.n_iterations;

        for i in 0..n {
            let temp = self.config.initial_temp * self.config.alpha_cool.powi(i as i32);
            let explore_prob = self.config.explore_ratio * (1.0 - i as f64 / n as f64);

            let explore = rng.uniform01() < explore_prob;
            let mv: Move = if explore {
                sample_explore_move(problem, &mut rng)
            } else {
                sample_exploit_move(&mut rng)
            };

            let mut candidate_encoding = apply(mv, current.encoding(), &mut rng, &ctx);
            if !explore && problem.has_precedences() {
                candidate_encoding = apply(
                    Move::PartialPrecedenceRepair,
                    &candidate_encoding,
                    &mut rng,
                    &ctx,
                );
            }
            let candidate_milestones = build_timeline(problem, &candidate_encoding);
            let candidate_cost =
                evaluate(problem, &candidate_encoding, &candidate_milestones, &ctx.weights);

            let p = if candidate_cost.total < current.cost().total {
                1.0
            } else {
                acceptance_probability(candidate_cost.total - current.cost().total, temp)
            };

            if rng.uniform01() < p {
                current.update(candidate_encoding.clone(), candidate_milestones.clone(), candidate_cost);
            }
            if candidate_cost.total < best.cost().total {
                best = Solution::new(candidate_encoding, candidate_milestones, candidate_cost);
            }

            if cancel.load(Ordering::Relaxed) {
                history.push_sa(i, current.cost().total, best.cost().total);
                break;
            }
            history.push_sa(i, current.cost().total, best.cost().total);

            if temp < 1e-8 {
                break;
            }
        }

        OptimizeResult {
            best_schedule: best.encoding().clone(),
            best_cost: *best.cost(),
            best_milestones: best.milestones().to_vec(),
            history,
        }
    }
}

/// `exp(-delta/temp)`, guarded against division by zero (`temp <= 0`)
/// and overflow; both resolve to probability `0.0`. Only called for
/// `delta >= 0` (a strict improvement is accepted with probability 1
/// by the caller before this is reached).
fn acceptance_probability(delta: f64, temp: f64) -> f64 {
    if temp <= 0.0 {
        return 0.0;
    }
    let p = (-delta / temp).exp();
    if p.is_finite() {
        p
    } else {
        0.0
    }
}
