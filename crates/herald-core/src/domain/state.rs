//! Task state machine - タスクの状態遷移

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task.
///
/// State transitions (forward only):
/// - Submitted -> Working -> Completed | Failed | Canceled
/// - Submitted -> Completed | Failed | Canceled (Working is optional)
///
/// Terminal states accept no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Accepted and waiting for a worker.
    Submitted,

    /// Picked up by a worker.
    Working,

    /// Finished with a result.
    Completed,

    /// Finished with an error description.
    Failed,

    /// Stopped on request before finishing.
    Canceled,
}

impl TaskState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    fn rank(self) -> u8 {
        match self {
            TaskState::Submitted => 0,
            TaskState::Working => 1,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled => 2,
        }
    }

    /// Whether `self -> next` moves strictly forward.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::start(TaskState::Submitted, TaskState::Working)]
    #[case::skip_working(TaskState::Submitted, TaskState::Completed)]
    #[case::cancel_early(TaskState::Submitted, TaskState::Canceled)]
    #[case::complete(TaskState::Working, TaskState::Completed)]
    #[case::fail(TaskState::Working, TaskState::Failed)]
    #[case::cancel_running(TaskState::Working, TaskState::Canceled)]
    fn forward_transitions_are_allowed(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case::backwards(TaskState::Working, TaskState::Submitted)]
    #[case::same_state(TaskState::Working, TaskState::Working)]
    #[case::resubmit(TaskState::Submitted, TaskState::Submitted)]
    #[case::after_complete(TaskState::Completed, TaskState::Failed)]
    #[case::after_cancel(TaskState::Canceled, TaskState::Completed)]
    #[case::after_fail(TaskState::Failed, TaskState::Working)]
    fn other_transitions_are_rejected(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn serializes_lowercase() {
        let s = serde_json::to_string(&TaskState::Canceled).unwrap();
        assert_eq!(s, "\"canceled\"");
        assert_eq!(TaskState::Working.to_string(), "working");
    }
}
