//! Events - task state-transition notifications.

use serde::{Deserialize, Serialize};

use super::{ContextId, Task, TaskId, TaskState};

/// Emitted once per state transition of a task (including creation).
///
/// `is_final` is true exactly for the event that carries a terminal state;
/// a stream ends after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: TaskId,
    pub context_id: ContextId,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_final: bool,
}

impl TaskEvent {
    /// Snapshot of `task`'s current state.
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            context_id: task.context_id,
            state: task.state,
            result: task.result.clone(),
            error: task.error.clone(),
            is_final: task.state.is_terminal(),
        }
    }
}
