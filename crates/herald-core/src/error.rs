use thiserror::Error;

use crate::domain::{TaskId, TaskState, TransitionError};
use crate::ports::StoreError;

/// Failure to apply a state transition through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The record vanished (evicted or deleted). Never recreated.
    #[error("task {0} is missing from the store")]
    Missing(TaskId),

    #[error(transparent)]
    Rejected(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure to hand a unit of work to the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("work queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("worker pool is shut down")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("timed out waiting for task {task_id} (last state: {last_state})")]
    TimedOut { task_id: TaskId, last_state: TaskState },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Crate-level error for fallible setup paths.
#[derive(Debug, Error)]
pub enum HeraldError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Poll(#[from] PollError),
}
