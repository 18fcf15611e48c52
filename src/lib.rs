//! upm-scheduler - unrelated-parallel-machine scheduling with sequence-dependent
//! setups, precedence constraints, a shared renewable resource pool, and a
//! time-varying energy cap.
//!
//! The crate is organized leaves-first, mirroring the dependency order in
//! which the components are used by the search engines:
//!
//! - [`rng`] - seedable, reproducible source of randomness
//! - [`problem`] - immutable problem instance (tasks, setups, precedences, resources)
//! - [`moves`] - neighborhood operators over a schedule encoding
//! - [`timeline`] - turns an encoding into timed, resource-feasible milestones
//! - [`objective`] - scores a timed schedule against the weighted objective
//! - [`solution`] - the owned `{encoding, milestones, cost}` triple
//! - [`history`] - per-iteration search history, retained at a configurable detail level
//! - [`engines`] - the SA, WOA, and Hybrid search engines

pub mod engines;
pub mod history;
pub mod moves;
pub mod objective;
pub mod problem;
pub mod rng;
pub mod solution;
pub mod timeline;

/// Identifier type for tasks. Tasks are numbered `0..problem.n_tasks()`.
pub type TaskId = usize;

/// Identifier type for machines. Machines are numbered `0..problem.n_machines()`.
pub type MachineId = usize;

/// A schedule encoding: `encoding[m]` is the ordered sequence of task ids
/// running on machine `m`. Every task id must appear exactly once across
/// the whole encoding (the partition invariant, checked by
/// [`problem::Problem::validate_encoding`]).
pub type Encoding = Vec<Vec<TaskId>>;

pub use history::{History, HistoryMode};
pub use objective::{CostRecord, PrecedenceMode, Weights};
pub use problem::{ConfigError, EnergyConstraint, Problem, Task};
pub use solution::Solution;
pub use timeline::Milestone;
