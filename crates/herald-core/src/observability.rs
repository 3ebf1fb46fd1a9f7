use serde::{Deserialize, Serialize};

use crate::domain::TaskState;

/// Number of stored tasks per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub submitted: usize,
    pub working: usize,
    pub completed: usize,
    pub failed: usize,
    pub canceled: usize,
}

impl StateCounts {
    pub fn tally(states: impl IntoIterator<Item = TaskState>) -> Self {
        let mut counts = Self::default();
        for state in states {
            counts.record(state);
        }
        counts
    }

    pub fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Submitted => self.submitted += 1,
            TaskState::Working => self.working += 1,
            TaskState::Completed => self.completed += 1,
            TaskState::Failed => self.failed += 1,
            TaskState::Canceled => self.canceled += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.submitted + self.working + self.completed + self.failed + self.canceled
    }

    /// Tasks not yet in a terminal state.
    pub fn in_flight(&self) -> usize {
        self.submitted + self.working
    }
}
