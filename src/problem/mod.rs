//! Immutable problem instance: tasks, sequence-dependent setups, optional
//! precedence constraints, an optional shared resource pool, and an
//! optional energy cap.
//!
//! A [`Problem`] is validated once at construction and is read-only for
//! the rest of its lifetime - every engine in [`crate::engines`] holds a
//! shared reference (or an `Arc`) to the same instance with no locking,
//! per the concurrency model in the specification.

mod error;

pub use error::ConfigError;

use crate::{Encoding, MachineId, TaskId};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single unit of work. Task identity is the index into
/// [`Problem::tasks`] - there is no separate id field to keep in sync.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    /// Processing time on each machine, indexed by [`MachineId`]. Every
    /// entry must be strictly positive (an unrelated-parallel-machine
    /// task is assumed runnable, at some cost, anywhere).
    pub proc_times: Vec<f64>,
    /// Units of the shared resource pool held for the task's whole
    /// `[start_setup, complete_time)` interval.
    pub resource: f64,
    /// Importance weight used in the load-imbalance term.
    pub weight: f64,
    /// Energy draw per machine while the task's setup+processing is in
    /// progress. `None` if the instance has no energy cap.
    pub energy: Option<Vec<f64>>,
}

impl Task {
    pub fn new(proc_times: Vec<f64>, resource: f64, weight: f64) -> Self {
        Task {
            proc_times,
            resource,
            weight,
            energy: None,
        }
    }

    pub fn with_energy(mut self, energy: Vec<f64>) -> Self {
        self.energy = Some(energy);
        self
    }
}

/// Global energy cap and the per-task, per-machine usage that counts
/// against it while a task is executing (setup included).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnergyConstraint {
    pub cap: f64,
    /// `usages[task][machine]` is the draw of `task` if run on `machine`.
    /// Redundant with `Task::energy` but kept as a flat lookup the way
    /// the evaluator's event sweep wants it; built from the tasks'
    /// `energy` fields by [`Problem::new`].
    pub usages: HashMap<TaskId, Vec<f64>>,
}

/// The immutable scheduling instance: everything the engines need to
/// build, score, and mutate candidate schedules.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Problem {
    n_machines: usize,
    tasks: Vec<Task>,
    /// Dense `n_tasks x n_tasks` setup-time matrix. `setups[a][a]` is
    /// never consulted by the timeline builder (a task never pays setup
    /// against itself; the first task on a machine pays none), so its
    /// value is not validated.
    setups: Vec<Vec<f64>>,
    /// `precedences[b]` is the set of tasks that must complete before
    /// `b` may start. Kept as `BTreeMap`/`BTreeSet` (not `HashMap`/
    /// `HashSet`) so iterating it - as `partial_precedence_repair` and
    /// the precedence-penalty sweep both do - visits pairs in a fixed
    /// order; Rust's default hasher is randomized per process, which
    /// would otherwise make repaired encodings non-reproducible across
    /// runs for instances with interacting same-machine precedences.
    precedences: BTreeMap<TaskId, BTreeSet<TaskId>>,
    total_resource: Option<f64>,
    energy: Option<EnergyConstraint>,
}

impl Problem {
    /// Validates and constructs a problem instance.
    ///
    /// `precedences[b]` lists predecessors of `b` (tasks that must
    /// complete before `b` starts); an empty or absent entry means `b`
    /// has no precedence constraint.
    pub fn new(
        tasks: Vec<Task>,
        n_machines: usize,
        setups: Vec<Vec<f64>>,
        precedences: BTreeMap<TaskId, BTreeSet<TaskId>>,
        total_resource: Option<f64>,
        energy: Option<EnergyConstraint>,
    ) -> Result<Self, ConfigError> {
        let n_tasks = tasks.len();

        for (t, task) in tasks.iter().enumerate() {
            if task.proc_times.len() != n_machines {
                return Err(ConfigError::IncompleteProcessingTimes(t));
            }
            for (m, &p) in task.proc_times.iter().enumerate() {
                if !(p > 0.0) {
                    return Err(ConfigError::NonPositiveProcessingTime {
                        task: t,
                        machine: m,
                        value: p,
                    });
                }
            }
        }

        if setups.len() != n_tasks {
            return Err(ConfigError::SetupMatrixWrongSize {
                rows: setups.len(),
                n_tasks,
            });
        }
        for (a, row) in setups.iter().enumerate() {
            if row.len() != n_tasks {
                return Err(ConfigError::SetupMatrixRowWrongSize {
                    row: a,
                    cols: row.len(),
                    n_tasks,
                });
            }
            for (b, &s) in row.iter().enumerate() {
                if s < 0.0 {
                    return Err(ConfigError::NegativeSetupTime {
                        from: a,
                        to: b,
                        value: s,
                    });
                }
            }
        }

        for (&b, preds) in &precedences {
            if b >= n_tasks {
                return Err(ConfigError::UnknownPrecedenceTask(b));
            }
            for &a in preds {
                if a >= n_tasks {
                    return Err(ConfigError::UnknownPrecedenceTask(a));
                }
            }
        }
        validate_acyclic(n_tasks, &precedences)?;

        if let Some(r_total) = total_resource {
            for (t, task) in tasks.iter().enumerate() {
                if task.resource > r_total {
                    return Err(ConfigError::ResourceExceedsPool {
                        task: t,
                        required: task.resource,
                        total: r_total,
                    });
                }
            }
        }

        if let Some(energy) = &energy {
            if energy.cap < 0.0 {
                return Err(ConfigError::NegativeEnergyCap(energy.cap));
            }
            for (&t, usage) in &energy.usages {
                if t >= n_tasks {
                    return Err(ConfigError::UnknownEnergyTask(t));
                }
                if usage.len() != n_machines {
                    return Err(ConfigError::EnergyUsageWrongSize {
                        task: t,
                        cols: usage.len(),
                        n_machines,
                    });
                }
            }
        }

        Ok(Problem {
            n_machines,
            tasks,
            setups,
            precedences,
            total_resource,
            energy,
        })
    }

    /// Builds the problem's `energy` field from each task's own `energy`
    /// vector, for callers who prefer to attach energy draw to the task
    /// rather than assembling the flat `usages` map by hand.
    pub fn energy_constraint_from_tasks(cap: f64, tasks: &[Task]) -> EnergyConstraint {
        let mut usages = HashMap::new();
        for (t, task) in tasks.iter().enumerate() {
            if let Some(e) = &task.energy {
                usages.insert(t, e.clone());
            }
        }
        EnergyConstraint { cap, usages }
    }

    pub fn n_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn n_machines(&self) -> usize {
        self.n_machines
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    /// Setup time charged when `b` follows `a` on the same machine.
    pub fn setup(&self, a: TaskId, b: TaskId) -> f64 {
        self.setups[a][b]
    }

    pub fn precedences(&self) -> &BTreeMap<TaskId, BTreeSet<TaskId>> {
        &self.precedences
    }

    pub fn has_precedences(&self) -> bool {
        self.precedences.values().any(|preds| !preds.is_empty())
    }

    pub fn total_resource(&self) -> Option<f64> {
        self.total_resource
    }

    pub fn energy(&self) -> Option<&EnergyConstraint> {
        self.energy.as_ref()
    }

    pub fn energy_usage(&self, task: TaskId, machine: MachineId) -> f64 {
        self.energy
            .as_ref()
            .and_then(|e| e.usages.get(&task))
            .map(|v| v[machine])
            .unwrap_or(0.0)
    }

    /// Builds an empty encoding: one empty sequence per machine.
    pub fn empty_encoding(&self) -> Encoding {
        vec![Vec::new(); self.n_machines]
    }

    /// Checks the partition invariant: `encoding` has exactly
    /// `n_machines` sequences, and every task id in `0..n_tasks` appears
    /// in exactly one of them.
    pub fn validate_encoding(&self, encoding: &Encoding) -> bool {
        if encoding.len() != self.n_machines {
            return false;
        }
        let mut seen = vec![false; self.n_tasks()];
        for seq in encoding {
            for &t in seq {
                if t >= self.n_tasks() || seen[t] {
                    return false;
                }
                seen[t] = true;
            }
        }
        seen.into_iter().all(|s| s)
    }
}

fn validate_acyclic(
    n_tasks: usize,
    precedences: &BTreeMap<TaskId, BTreeSet<TaskId>>,
) -> Result<(), ConfigError> {
    let mut graph = DiGraph::<(), ()>::with_capacity(n_tasks, 0);
    let nodes: Vec<_> = (0..n_tasks).map(|_| graph.add_node(())).collect();
    for (&b, preds) in precedences {
        for &a in preds {
            // a must complete before b: edge a -> b
            graph.add_edge(nodes[a], nodes[b], ());
        }
    }
    toposort(&graph, None)
        .map(|_| ())
        .map_err(|_| ConfigError::PrecedenceCycle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_task(p0: f64, p1: f64) -> Task {
        Task::new(vec![p0, p1], 1.0, 1.0)
    }

    fn zero_setups(n: usize) -> Vec<Vec<f64>> {
        vec![vec![0.0; n]; n]
    }

    #[test]
    fn construction_accepts_minimal_valid_instance() {
        let tasks = vec![simple_task(5.0, 7.0), simple_task(3.0, 4.0)];
        let problem = Problem::new(tasks, 2, zero_setups(2), BTreeMap::new(), None, None).unwrap();
        assert_eq!(problem.n_tasks(), 2);
        assert_eq!(problem.n_machines(), 2);
    }

    #[test]
    fn rejects_non_positive_processing_time() {
        let tasks = vec![Task::new(vec![0.0, 1.0], 1.0, 1.0)];
        let err = Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), None, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositiveProcessingTime { task: 0, machine: 0, .. }
        ));
    }

    #[test]
    fn rejects_incomplete_processing_times() {
        let tasks = vec![Task::new(vec![1.0], 1.0, 1.0)];
        let err = Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), None, None).unwrap_err();
        assert_eq!(err, ConfigError::IncompleteProcessingTimes(0));
    }

    #[test]
    fn rejects_wrong_setup_matrix_size() {
        let tasks = vec![simple_task(1.0, 1.0), simple_task(1.0, 1.0)];
        let err = Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::SetupMatrixWrongSize { .. }));
    }

    #[test]
    fn rejects_negative_setup_time() {
        let tasks = vec![simple_task(1.0, 1.0), simple_task(1.0, 1.0)];
        let mut setups = zero_setups(2);
        setups[0][1] = -1.0;
        let err = Problem::new(tasks, 2, setups, BTreeMap::new(), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeSetupTime { from: 0, to: 1, .. }));
    }

    #[test]
    fn rejects_precedence_cycle() {
        let tasks = vec![simple_task(1.0, 1.0), simple_task(1.0, 1.0)];
        let mut prec = BTreeMap::new();
        prec.insert(0, BTreeSet::from([1]));
        prec.insert(1, BTreeSet::from([0]));
        let err = Problem::new(tasks, 2, zero_setups(2), prec, None, None).unwrap_err();
        assert_eq!(err, ConfigError::PrecedenceCycle);
    }

    #[test]
    fn rejects_self_precedence_cycle() {
        let tasks = vec![simple_task(1.0, 1.0)];
        let mut prec = BTreeMap::new();
        prec.insert(0, BTreeSet::from([0]));
        let err = Problem::new(tasks, 2, zero_setups(1), prec, None, None).unwrap_err();
        assert_eq!(err, ConfigError::PrecedenceCycle);
    }

    #[test]
    fn rejects_unknown_precedence_task() {
        let tasks = vec![simple_task(1.0, 1.0)];
        let mut prec = BTreeMap::new();
        prec.insert(0, BTreeSet::from([5]));
        let err = Problem::new(tasks, 2, zero_setups(1), prec, None, None).unwrap_err();
        assert_eq!(err, ConfigError::UnknownPrecedenceTask(5));
    }

    #[test]
    fn rejects_resource_exceeding_pool() {
        let tasks = vec![Task::new(vec![1.0, 1.0], 10.0, 1.0)];
        let err =
            Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), Some(5.0), None).unwrap_err();
        assert!(matches!(err, ConfigError::ResourceExceedsPool { task: 0, .. }));
    }

    #[test]
    fn accepts_resource_at_exact_pool_capacity() {
        let tasks = vec![Task::new(vec![1.0, 1.0], 5.0, 1.0)];
        let problem =
            Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), Some(5.0), None).unwrap();
        assert_eq!(problem.total_resource(), Some(5.0));
    }

    #[test]
    fn rejects_negative_energy_cap() {
        let tasks = vec![simple_task(1.0, 1.0)];
        let energy = EnergyConstraint {
            cap: -1.0,
            usages: HashMap::new(),
        };
        let err =
            Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), None, Some(energy)).unwrap_err();
        assert_eq!(err, ConfigError::NegativeEnergyCap(-1.0));
    }

    #[test]
    fn rejects_energy_usage_wrong_size() {
        let tasks = vec![simple_task(1.0, 1.0)];
        let mut usages = HashMap::new();
        usages.insert(0, vec![1.0]);
        let energy = EnergyConstraint { cap: 10.0, usages };
        let err =
            Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), None, Some(energy)).unwrap_err();
        assert!(matches!(err, ConfigError::EnergyUsageWrongSize { task: 0, .. }));
    }

    #[test]
    fn validate_encoding_accepts_full_partition() {
        let tasks = vec![simple_task(1.0, 1.0), simple_task(1.0, 1.0)];
        let problem = Problem::new(tasks, 2, zero_setups(2), BTreeMap::new(), None, None).unwrap();
        assert!(problem.validate_encoding(&vec![vec![0], vec![1]]));
        assert!(problem.validate_encoding(&vec![vec![0, 1], vec![]]));
    }

    #[test]
    fn validate_encoding_rejects_duplicate_task() {
        let tasks = vec![simple_task(1.0, 1.0), simple_task(1.0, 1.0)];
        let problem = Problem::new(tasks, 2, zero_setups(2), BTreeMap::new(), None, None).unwrap();
        assert!(!problem.validate_encoding(&vec![vec![0, 0], vec![1]]));
    }

    #[test]
    fn validate_encoding_rejects_missing_task() {
        let tasks = vec![simple_task(1.0, 1.0), simple_task(1.0, 1.0)];
        let problem = Problem::new(tasks, 2, zero_setups(2), BTreeMap::new(), None, None).unwrap();
        assert!(!problem.validate_encoding(&vec![vec![0], vec![]]));
    }

    #[test]
    fn validate_encoding_rejects_wrong_machine_count() {
        let tasks = vec![simple_task(1.0, 1.0)];
        let problem = Problem::new(tasks, 2, zero_setups(1), BTreeMap::new(), None, None).unwrap();
        assert!(!problem.validate_encoding(&vec![vec![0]]));
    }

    #[test]
    fn empty_problem_has_well_formed_empty_encoding() {
        let problem = Problem::new(vec![], 3, vec![], BTreeMap::new(), None, None).unwrap();
        let enc = problem.empty_encoding();
        assert_eq!(enc.len(), 3);
        assert!(problem.validate_encoding(&enc));
    }
}
