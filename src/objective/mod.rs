//! Multi-term objective evaluator.
//!
//! Scores a timed schedule against four weighted terms: makespan,
//! precedence-violation penalty, per-machine load imbalance, and
//! energy-cap overshoot.

use crate::problem::Problem;
use crate::timeline::{build_timeline, Milestone};
use crate::{Encoding, TaskId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Weight triple applied to the three soft/hard penalty terms. Always
/// passed explicitly to [`evaluate`] - never defaulted inside the
/// evaluator, so a caller can never silently score against the wrong
/// weights.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Weights {
    pub alpha_precedence: f64,
    pub alpha_load: f64,
    pub alpha_energy: f64,
}

impl Weights {
    /// The documented recommended defaults: a hard precedence penalty
    /// (`10^6`) and unit weight on the two soft terms.
    pub fn recommended() -> Self {
        Weights {
            alpha_precedence: 1e6,
            alpha_load: 1.0,
            alpha_energy: 1.0,
        }
    }
}

/// Which interpretation of a precedence violation to use.
/// `Additive` is the crate default: an encoding-index check restricted
/// to same-machine pairs, added as a term. `Shortcut` reproduces the
/// other documented source behavior where the violation replaces the
/// entire cost. `MilestoneShift` reproduces the third documented
/// behavior: the same-machine encoding-index check is replaced by a
/// timing check (`complete_time(a) > start_process(b)`) against the
/// built milestones, which also catches cross-machine violations that
/// the encoding-index check cannot see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceMode {
    Additive,
    Shortcut,
    MilestoneShift,
}

/// The four decomposed cost terms plus their weighted sum.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CostRecord {
    pub total: f64,
    pub makespan: f64,
    pub load_std: f64,
    pub precedence_penalty: f64,
    pub energy_overshoot: f64,
}

/// Scores `encoding` given its already-built `milestones`, using the
/// additive precedence-penalty interpretation.
pub fn evaluate(
    problem: &Problem,
    encoding: &Encoding,
    milestones: &[Milestone],
    weights: &Weights,
) -> CostRecord {
    evaluate_with_mode(problem, encoding, milestones, weights, PrecedenceMode::Additive)
}

/// Builds the timeline for `encoding` and scores it in one step. Used by
/// moves (`lookahead_insertion`) and engines that need a one-shot score
/// of a candidate.
pub fn score(problem: &Problem, encoding: &Encoding, weights: &Weights) -> CostRecord {
    let milestones = build_timeline(problem, encoding);
    evaluate(problem, encoding, &milestones, weights)
}

pub fn evaluate_with_mode(
    problem: &Problem,
    _encoding: &Encoding,
    milestones: &[Milestone],
    weights: &Weights,
    mode: PrecedenceMode,
) -> CostRecord {
    let makespan = milestones.iter().map(|m| m.complete_time).fold(0.0, f64::max);
    let load_std = load_std_dev(problem, milestones);
    let energy_overshoot = energy_overshoot(problem, milestones);

    match mode {
        PrecedenceMode::Additive => {
            let precedence_penalty = precedence_penalty_distance(problem, milestones);
            let total = makespan
                + weights.alpha_precedence * precedence_penalty
                + weights.alpha_load * load_std
                + weights.alpha_energy * energy_overshoot;
            CostRecord {
                total,
                makespan,
                load_std,
                precedence_penalty,
                energy_overshoot,
            }
        }
        PrecedenceMode::Shortcut => {
            let precedence_distance = precedence_penalty_distance(problem, milestones);
            if precedence_distance > 0.0 {
                CostRecord {
                    total: weights.alpha_precedence * precedence_distance,
                    makespan,
                    load_std,
                    precedence_penalty: precedence_distance,
                    energy_overshoot,
                }
            } else {
                let total = makespan
                    + weights.alpha_load * load_std
                    + weights.alpha_energy * energy_overshoot;
                CostRecord {
                    total,
                    makespan,
                    load_std,
                    precedence_penalty: 0.0,
                    energy_overshoot,
                }
            }
        }
        PrecedenceMode::MilestoneShift => {
            let precedence_penalty = precedence_penalty_milestone_shift(problem, milestones);
            let total = makespan
                + weights.alpha_precedence * precedence_penalty
                + weights.alpha_load * load_std
                + weights.alpha_energy * energy_overshoot;
            CostRecord {
                total,
                makespan,
                load_std,
                precedence_penalty,
                energy_overshoot,
            }
        }
    }
}

fn precedence_penalty_distance(problem: &Problem, milestones: &[Milestone]) -> f64 {
    if !problem.has_precedences() {
        return 0.0;
    }
    let mut distance = 0.0;
    for (&b, preds) in problem.precedences() {
        for &a in preds {
            let ma = &milestones[a];
            let mb = &milestones[b];
            if ma.machine == mb.machine && ma.index_on_machine > mb.index_on_machine {
                distance += (ma.index_on_machine as f64 - mb.index_on_machine as f64).abs();
            }
        }
    }
    distance
}

/// The milestone-shift variant of the precedence penalty: instead of
/// comparing encoded positions (and so only catching same-machine
/// violations), this compares actual timing and catches a violation
/// wherever `a`'s completion runs past `b`'s process start, whether or
/// not `a` and `b` share a machine.
fn precedence_penalty_milestone_shift(problem: &Problem, milestones: &[Milestone]) -> f64 {
    if !problem.has_precedences() {
        return 0.0;
    }
    let mut shift = 0.0;
    for (&b, preds) in problem.precedences() {
        for &a in preds {
            let ma = &milestones[a];
            let mb = &milestones[b];
            shift += (ma.complete_time - mb.start_process).max(0.0);
        }
    }
    shift
}

fn load_std_dev(problem: &Problem, milestones: &[Milestone]) -> f64 {
    let n_machines = problem.n_machines();
    if n_machines <= 1 {
        return 0.0;
    }
    let mut load = vec![0.0; n_machines];
    for (t, m) in milestones.iter().enumerate() {
        let task = problem.task(t as TaskId);
        load[m.machine] += task.proc_times[m.machine] * task.weight;
    }
    let mean = load.iter().sum::<f64>() / n_machines as f64;
    let variance = load.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n_machines as f64;
    variance.sqrt()
}

fn energy_overshoot(problem: &Problem, milestones: &[Milestone]) -> f64 {
    let cap = match problem.energy() {
        Some(e) => e.cap,
        None => return 0.0,
    };

    let mut events: Vec<(f64, f64)> = Vec::new();
    for (t, m) in milestones.iter().enumerate() {
        let usage = problem.energy_usage(t as TaskId, m.machine);
        if usage != 0.0 {
            events.push((m.start_setup, usage));
            events.push((m.complete_time, -usage));
        }
    }
    if events.is_empty() {
        return 0.0;
    }
    events.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("milestone times are finite"));

    let mut overshoot = 0.0;
    let mut current = 0.0;
    let mut prev_time = events[0].0;
    for (time, delta) in events {
        let dt = time - prev_time;
        if dt > 0.0 {
            overshoot += (current - cap).max(0.0) * dt;
        }
        current += delta;
        prev_time = time;
    }
    overshoot
}
