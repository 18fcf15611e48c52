//! Population-based Whale Optimization: encircling, exploring, and
//! spiral-update phases driven by a shrinking coefficient `a`.

use super::{empty_result, sample_exploit_move, sample_explore_move, OptimizeResult, Optimizer};
use crate::history::{History, HistoryMode};
use crate::moves::{apply, Move, MoveContext};
use crate::objective::{evaluate, Weights};
use crate::problem::Problem;
use crate::rng::RngSource;
use crate::solution::Solution;
use crate::timeline::build_timeline;
use crate::{Encoding, TaskId};
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WoaConfig {
    pub n_iterations: usize,
    pub n_agents: usize,
    pub explore_ratio: f64,
    pub weights: Weights,
    pub seed: u64,
    pub history_mode: HistoryMode,
}

impl WoaConfig {
    /// The documented recommended defaults (`n_agents = 10`,
    /// `explore_ratio = 0.5`) for a given iteration budget, weights, and
    /// seed.
    pub fn recommended(n_iterations: usize, weights: Weights, seed: u64) -> Self {
        WoaConfig {
            n_iterations,
            n_agents: 10,
            explore_ratio: 0.5,
            weights,
            seed,
            history_mode: HistoryMode::Summary,
        }
    }
}

pub struct WoaEngine<'p> {
    problem: &'p Problem,
    config: WoaConfig,
}

impl<'p> WoaEngine<'p> {
    pub fn new(problem: &'p Problem, config: WoaConfig) -> Self {
        WoaEngine { problem, config }
    }

    pub(crate) fn config(&self) -> &WoaConfig {
        &self.config
    }

    pub(crate) fn problem(&self) -> &'p Problem {
        self.problem
    }
}

impl<'p> Optimizer for WoaEngine<'p> {
    fn optimize(&mut self, cancel: &AtomicBool) -> OptimizeResult {
        run(self.problem, &self.config, cancel, |_, _, _, _, _| None)
    }
}

/// Runs the WOA loop. `local_refine` is called once per agent, per
/// iteration, with the just-produced candidate; it returns `Some`
/// replacement candidate (encoding, milestones, cost) if local
/// refinement strictly improved it, or `None` to keep the candidate
/// as-is. The Hybrid engine supplies an SA-style greedy refiner here;
/// plain WOA supplies a no-op.
pub(crate) fn run(
    problem: &Problem,
    config: &WoaConfig,
    cancel: &AtomicBool,
    mut local_refine: impl FnMut(
        &Problem,
        &MoveContext,
        &mut RngSource,
        &Encoding,
        &crate::objective::CostRecord,
    ) -> Option<(Encoding, Vec<crate::timeline::Milestone>, crate::objective::CostRecord)>,
) -> OptimizeResult {
    if problem.n_tasks() == 0 || problem.n_machines() == 0 {
        return empty_result(problem);
    }

    let mut rng = RngSource::new(config.seed);
    let ctx = MoveContext {
        problem,
        weights: &config.weights,
    };

    let n_agents = config.n_agents.max(1);
    let mut agents: Vec<Solution> = (0..n_agents)
        .map(|_| {
            let encoding = crate::moves::regenerate(problem, &mut rng);
            let milestones = build_timeline(problem, &encoding);
            let cost = evaluate(problem, &encoding, &milestones, &ctx.weights);
            Solution::new(encoding, milestones, cost)
        })
        .collect();

    let mut best = agents
        .iter()
        .min_by(|a, b| a.cost().total.partial_cmp(&b.cost().total).unwrap())
        .unwrap()
        .clone();

    let mut history = History::new(config.history_mode);
    let n = config.n_iterations;

    for i in 0..n {
        let a = 2.0 - 2.0 * i as f64 / n as f64;

        for agent in agents.iter_mut() {
            let r1 = rng.uniform01();
            let p = rng.uniform01();
            let big_a = 2.0 * a * r1 - a;

            let mut candidate_encoding = if p < config.explore_ratio {
                if big_a.abs() <= 1.0 {
                    shrinking_encircle(&ctx, &mut rng, best.encoding(), a)
                } else {
                    let mv = sample_explore_move(problem, &mut rng);
                    apply(mv, agent.encoding(), &mut rng, &ctx)
                }
            } else {
                spiral_update(agent.encoding(), best.encoding(), &mut rng)
            };

            if p < config.explore_ratio && big_a.abs() <= 1.0 && problem.has_precedences() {
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

            let (candidate_encoding, candidate_milestones, candidate_cost) = match local_refine(
                problem,
                &ctx,
                &mut rng,
                &candidate_encoding,
                &candidate_cost,
            ) {
                Some((e, m, c)) => (e, m, c),
                None => (candidate_encoding, candidate_milestones, candidate_cost),
            };

            if candidate_cost.total < agent.cost().total {
                agent.update(candidate_encoding, candidate_milestones, candidate_cost);
            }
            if agent.cost().total < best.cost().total {
                best = agent.clone();
            }
        }

        let agent_costs: Vec<f64> = agents.iter().map(|s| s.cost().total).collect();
        let agent_encodings = if history.mode() == HistoryMode::Full {
            Some(agents.iter().map(|s| s.encoding().clone()).collect())
        } else {
            None
        };

        if cancel.load(Ordering::Relaxed) {
            history.push_woa(i, agent_costs, agent_encodings, best.cost().total);
            break;
        }
        history.push_woa(i, agent_costs, agent_encodings, best.cost().total);

        if a < 1e-8 {
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

fn shrinking_encircle(
    ctx: &MoveContext,
    rng: &mut RngSource,
    best_encoding: &Encoding,
    a: f64,
) -> Encoding {
    let floor_term = (10.0 * a).floor().max(0.0) as usize;
    let upper = (floor_term + 1).max(1);
    let n_moves = 1 + rng.uniform_usize(upper);

    let mut candidate = best_encoding.clone();
    for _ in 0..n_moves {
        let mv = sample_exploit_move(rng);
        candidate = apply(mv, &candidate, rng, ctx);
    }
    candidate
}

/// Reorders each chosen machine's tasks by their position in
/// `best_encoding[m]`; tasks absent from `best_encoding[m]` keep
/// "infinity" priority, which (since the sort is stable) preserves
/// their original relative order among themselves.
fn spiral_update(agent_encoding: &Encoding, best_encoding: &Encoding, rng: &mut RngSource) -> Encoding {
    let mut enc = agent_encoding.clone();
    let n_machines = enc.len();
    if n_machines == 0 {
        return enc;
    }
    let k = 1 + rng.uniform_usize(n_machines);
    for m in rng.choose_k_distinct(n_machines, k) {
        let priority = |t: TaskId| -> usize {
            best_encoding
                .get(m)
                .and_then(|seq| seq.iter().position(|&x| x == t))
                .unwrap_or(usize::MAX)
        };
        enc[m].sort_by_key(|&t| priority(t));
    }
    enc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Task;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;

    fn setup_matters_problem() -> Problem {
        let tasks = vec![Task::new(vec![3.0], 0.0, 1.0), Task::new(vec![4.0], 0.0, 1.0)];
        let setups = vec![vec![0.0, 2.0], vec![5.0, 0.0]];
        Problem::new(tasks, 1, setups, BTreeMap::new(), None, None).unwrap()
    }

    #[test]
    fn woa_finds_the_lower_setup_order() {
        let problem = setup_matters_problem();
        let config = WoaConfig::recommended(100, Weights::recommended(), 42);
        let mut engine = WoaEngine::new(&problem, config);
        let cancel = AtomicBool::new(false);
        let result = engine.optimize(&cancel);
        assert_eq!(result.best_cost.makespan, 9.0);
    }

    #[test]
    fn same_seed_and_params_are_bit_identical_across_runs() {
        let problem = setup_matters_problem();
        let cancel = AtomicBool::new(false);
        let mut e1 = WoaEngine::new(&problem, WoaConfig::recommended(50, Weights::recommended(), 11));
        let r1 = e1.optimize(&cancel);
        let mut e2 = WoaEngine::new(&problem, WoaConfig::recommended(50, Weights::recommended(), 11));
        let r2 = e2.optimize(&cancel);
        assert_eq!(r1.best_cost, r2.best_cost);
        assert_eq!(r1.best_schedule, r2.best_schedule);
    }

    #[test]
    fn best_total_is_non_increasing_across_iterations() {
        let problem = setup_matters_problem();
        let config = WoaConfig::recommended(80, Weights::recommended(), 5);
        let mut engine = WoaEngine::new(&problem, config);
        let cancel = AtomicBool::new(false);
        let result = engine.optimize(&cancel);
        let mut prev = f64::INFINITY;
        for entry in result.history.woa_entries() {
            assert!(entry.best_total <= prev + 1e-9);
            prev = entry.best_total;
        }
    }

    #[test]
    fn empty_problem_returns_well_formed_empty_result() {
        let problem = Problem::new(vec![], 1, vec![], BTreeMap::new(), None, None).unwrap();
        let config = WoaConfig::recommended(10, Weights::recommended(), 1);
        let mut engine = WoaEngine::new(&problem, config);
        let cancel = AtomicBool::new(false);
        let result = engine.optimize(&cancel);
        assert!(result.history.is_empty());
        assert_eq!(result.best_cost.total, 0.0);
    }

    #[test]
    fn spiral_update_preserves_partition_per_machine() {
        let best = vec![vec![2, 0, 1], vec![]];
        let agent = vec![vec![0, 1, 2], vec![]];
        let mut rng = RngSource::new(3);
        let result = spiral_update(&agent, &best, &mut rng);
        let mut a = result[0].clone();
        a.sort_unstable();
        assert_eq!(a, vec![0, 1, 2]);
    }
}
