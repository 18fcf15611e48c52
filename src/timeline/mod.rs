//! Timeline builder: turns a schedule encoding into per-task milestones.
//!
//! Two algorithms, selected by whether the problem configures a shared
//! resource pool: a resource-aware event-driven simulation, or a plain
//! sequential accumulation per machine.

use crate::problem::Problem;
use crate::{Encoding, MachineId, TaskId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The derived timing of one task: when its setup begins, when
/// processing begins, when it finishes, and its position in the
/// schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Milestone {
    pub start_setup: f64,
    pub start_process: f64,
    pub complete_time: f64,
    pub machine: MachineId,
    pub index_on_machine: usize,
}

/// Builds milestones for every task in `encoding`. `encoding` is assumed
/// to satisfy [`Problem::validate_encoding`] - callers that cannot
/// guarantee this (e.g. a move under construction) should check first.
pub fn build_timeline(problem: &Problem, encoding: &Encoding) -> Vec<Milestone> {
    match problem.total_resource() {
        Some(r_total) => build_resource_aware(problem, encoding, r_total),
        None => build_sequential(problem, encoding),
    }
}

fn build_sequential(problem: &Problem, encoding: &Encoding) -> Vec<Milestone> {
    let mut milestones = vec![Milestone::default(); problem.n_tasks()];
    for (m, seq) in encoding.iter().enumerate() {
        let mut clock = 0.0;
        let mut prev: Option<TaskId> = None;
        for (idx, &t) in seq.iter().enumerate() {
            let setup = match prev {
                Some(p) => problem.setup(p, t),
                None => 0.0,
            };
            let start_setup = clock;
            let start_process = start_setup + setup;
            let complete_time = start_process + problem.task(t).proc_times[m];
            milestones[t] = Milestone {
                start_setup,
                start_process,
                complete_time,
                machine: m,
                index_on_machine: idx,
            };
            clock = complete_time;
            prev = Some(t);
        }
    }
    milestones
}

fn build_resource_aware(problem: &Problem, encoding: &Encoding, r_total: f64) -> Vec<Milestone> {
    let n_machines = encoding.len();
    let n_tasks = problem.n_tasks();
    let mut milestones = vec![Milestone::default(); n_tasks];
    let mut head = vec![0usize; n_machines];
    let mut machine_free_at = vec![0.0f64; n_machines];
    // (task, end_time, resource held)
    let mut running: Vec<(TaskId, f64, f64)> = Vec::new();
    let mut pool = r_total;
    let mut clock = 0.0f64;
    let mut completed = 0usize;

    while completed < n_tasks {
        // (a) release everything that has ended by `clock`.
        let mut still_running = Vec::with_capacity(running.len());
        for (t, end, res) in running.drain(..) {
            if end <= clock {
                pool += res;
                completed += 1;
            } else {
                still_running.push((t, end, res));
            }
        }
        running = still_running;

        // (b, c) scan machines ascending, admit while resource allows.
        let mut admitted_any = false;
        for m in 0..n_machines {
            if head[m] >= encoding[m].len() {
                continue;
            }
            if machine_free_at[m] > clock {
                continue;
            }
            let t = encoding[m][head[m]];
            let resource = problem.task(t).resource;
            if resource > pool {
                continue;
            }
            let setup = if head[m] == 0 {
                0.0
            } else {
                problem.setup(encoding[m][head[m] - 1], t)
            };
            let start_setup = machine_free_at[m].max(clock);
            let start_process = start_setup + setup;
            let complete_time = start_process + problem.task(t).proc_times[m];

            milestones[t] = Milestone {
                start_setup,
                start_process,
                complete_time,
                machine: m,
                index_on_machine: head[m],
            };
            pool -= resource;
            running.push((t, complete_time, resource));
            head[m] += 1;
            machine_free_at[m] = complete_time;
            admitted_any = true;
        }

        if admitted_any {
            continue;
        }

        // (d) nothing could start: advance the clock to the next event.
        let next_release = running
            .iter()
            .map(|&(_, end, _)| end)
            .fold(f64::INFINITY, f64::min);
        if next_release.is_finite() {
            clock = next_release;
            continue;
        }
        let next_free = (0..n_machines)
            .filter(|&m| head[m] < encoding[m].len())
            .map(|m| machine_free_at[m])
            .filter(|&f| f > clock)
            .fold(f64::INFINITY, f64::min);
        if next_free.is_finite() {
            clock = next_free;
        } else {
            // A validated problem (R_total >= max task resource) never
            // reaches this: every remaining task is eventually admissible.
            break;
        }
    }

    milestones
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Task;
    use std::collections::BTreeMap;

    #[test]
    fn sequential_single_machine_charges_setup_between_tasks() {
        let tasks = vec![Task::new(vec![3.0], 0.0, 1.0), Task::new(vec![4.0], 0.0, 1.0)];
        let setups = vec![vec![0.0, 2.0], vec![5.0, 0.0]];
        let problem = Problem::new(tasks, 1, setups, BTreeMap::new(), None, None).unwrap();
        let milestones = build_timeline(&problem, &vec![vec![0, 1]]);
        assert_eq!(milestones[0].start_setup, 0.0);
        assert_eq!(milestones[0].complete_time, 3.0);
        assert_eq!(milestones[1].start_setup, 3.0);
        assert_eq!(milestones[1].start_process, 5.0);
        assert_eq!(milestones[1].complete_time, 9.0);
    }

    #[test]
    fn single_task_makespan_is_its_own_processing_time() {
        let tasks = vec![Task::new(vec![9.0, 4.0], 0.0, 1.0)];
        let problem =
            Problem::new(tasks, 2, vec![vec![0.0]], BTreeMap::new(), None, None).unwrap();
        let milestones = build_timeline(&problem, &vec![vec![], vec![0]]);
        assert_eq!(milestones[0].complete_time, 4.0);
    }

    #[test]
    fn resource_pool_serializes_contending_tasks() {
        let tasks = vec![
            Task::new(vec![5.0, 5.0], 10.0, 1.0),
            Task::new(vec![5.0, 5.0], 10.0, 1.0),
        ];
        let setups = vec![vec![0.0; 2]; 2];
        let problem = Problem::new(tasks, 2, setups, BTreeMap::new(), Some(10.0), None).unwrap();
        let milestones = build_timeline(&problem, &vec![vec![0], vec![1]]);
        let makespan = milestones.iter().map(|m| m.complete_time).fold(0.0, f64::max);
        assert_eq!(makespan, 10.0);
    }

    #[test]
    fn resource_pool_lets_independent_tasks_run_concurrently() {
        let tasks = vec![
            Task::new(vec![5.0, 5.0], 4.0, 1.0),
            Task::new(vec![5.0, 5.0], 4.0, 1.0),
        ];
        let setups = vec![vec![0.0; 2]; 2];
        let problem = Problem::new(tasks, 2, setups, BTreeMap::new(), Some(10.0), None).unwrap();
        let milestones = build_timeline(&problem, &vec![vec![0], vec![1]]);
        assert_eq!(milestones[0].start_setup, 0.0);
        assert_eq!(milestones[1].start_setup, 0.0);
        let makespan = milestones.iter().map(|m| m.complete_time).fold(0.0, f64::max);
        assert_eq!(makespan, 5.0);
    }

    #[test]
    fn milestones_on_a_machine_are_monotone_and_non_overlapping() {
        let tasks = vec![
            Task::new(vec![2.0], 0.0, 1.0),
            Task::new(vec![3.0], 0.0, 1.0),
            Task::new(vec![1.0], 0.0, 1.0),
        ];
        let setups = vec![vec![0.0; 3]; 3];
        let problem = Problem::new(tasks, 1, setups, BTreeMap::new(), None, None).unwrap();
        let milestones = build_timeline(&problem, &vec![vec![0, 1, 2]]);
        assert_eq!(milestones[0].index_on_machine, 0);
        assert_eq!(milestones[1].index_on_machine, 1);
        assert_eq!(milestones[2].index_on_machine, 2);
        assert!(milestones[0].complete_time <= milestones[1].start_setup);
        assert!(milestones[1].complete_time <= milestones[2].start_setup);
    }

    #[test]
    fn empty_encoding_produces_no_milestones() {
        let problem = Problem::new(vec![], 2, vec![], BTreeMap::new(), None, None).unwrap();
        let milestones = build_timeline(&problem, &vec![vec![], vec![]]);
        assert!(milestones.is_empty());
    }
}
