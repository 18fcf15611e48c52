use thiserror::Error;

/// Errors raised while validating a [`super::Problem`] at construction.
///
/// These are configuration errors: a malformed instance, never a runtime
/// signal produced while searching. The engines never see this type -
/// once a `Problem` is constructed it is valid for the lifetime of the
/// search.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("task {task} has non-positive processing time {value} on machine {machine}")]
    NonPositiveProcessingTime {
        task: usize,
        machine: usize,
        value: f64,
    },

    #[error("task {0} is missing a processing time entry for one or more machines")]
    IncompleteProcessingTimes(usize),

    #[error("setup time from task {from} to task {to} is negative ({value})")]
    NegativeSetupTime { from: usize, to: usize, value: f64 },

    #[error("setup matrix has {rows} rows but {n_tasks} tasks were declared")]
    SetupMatrixWrongSize { rows: usize, n_tasks: usize },

    #[error("setup matrix row {row} has {cols} entries but {n_tasks} tasks were declared")]
    SetupMatrixRowWrongSize {
        row: usize,
        cols: usize,
        n_tasks: usize,
    },

    #[error("precedence relation references unknown task {0}")]
    UnknownPrecedenceTask(usize),

    #[error("precedence relation contains a cycle")]
    PrecedenceCycle,

    #[error("task {task} requires {required} resource units but the pool only holds {total}")]
    ResourceExceedsPool {
        task: usize,
        required: f64,
        total: f64,
    },

    #[error("energy usage references unknown task {0}")]
    UnknownEnergyTask(usize),

    #[error("energy usage for task {task} has {cols} entries but {n_machines} machines were declared")]
    EnergyUsageWrongSize {
        task: usize,
        cols: usize,
        n_machines: usize,
    },

    #[error("negative energy cap {0}")]
    NegativeEnergyCap(f64),
}
