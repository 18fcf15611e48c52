//! Exercises the optional `serde` feature: a `Problem` and a scored
//! `CostRecord` must round-trip through JSON unchanged.

#![cfg(feature = "serde")]

use std::collections::BTreeMap;

use upm_scheduler::objective::{score, Weights};
use upm_scheduler::{Problem, Task};

#[test]
fn problem_round_trips_through_json() {
    let tasks = vec![Task::new(vec![3.0, 4.0], 1.0, 1.0), Task::new(vec![2.0, 5.0], 1.0, 2.0)];
    let setups = vec![vec![0.0, 1.0], vec![2.0, 0.0]];
    let problem = Problem::new(tasks, 2, setups, BTreeMap::new(), Some(2.0), None).unwrap();

    let json = serde_json::to_string(&problem).expect("problem serializes");
    let decoded: Problem = serde_json::from_str(&json).expect("problem deserializes");

    assert_eq!(decoded.n_tasks(), problem.n_tasks());
    assert_eq!(decoded.n_machines(), problem.n_machines());
    assert_eq!(decoded.total_resource(), problem.total_resource());
}

#[test]
fn cost_record_round_trips_through_json() {
    let tasks = vec![Task::new(vec![3.0], 0.0, 1.0)];
    let problem = Problem::new(tasks, 1, vec![vec![0.0]], BTreeMap::new(), None, None).unwrap();
    let cost = score(&problem, &vec![vec![0]], &Weights::recommended());

    let json = serde_json::to_string(&cost).unwrap();
    let decoded: upm_scheduler::CostRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded, cost);
}
