//! Synchronous replies to inbound commands.

use std::fmt;

use super::{TaskId, TaskState};
use super::command::Verb;

/// What the executor answers to one command.
///
/// `Display` renders the user-visible response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A task was created and scheduled.
    Accepted(TaskId),
    /// The task finished; carries its result payload.
    Completed(String),
    /// The task exists but is not completed.
    Status(TaskState),
    /// The task was moved to `canceled`.
    Canceled(TaskId),
    NotFound,
    InvalidFormat(Verb),
    /// The worker queue is full; the new task was failed.
    Busy,
    StoreUnavailable,
    Unrecognized,
}

impl Reply {
    /// Replies that report a problem rather than a task outcome.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Reply::NotFound
                | Reply::InvalidFormat(_)
                | Reply::Busy
                | Reply::StoreUnavailable
                | Reply::Unrecognized
        )
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Accepted(id) => write!(f, "Task Accepted. ID: {id}"),
            Reply::Completed(result) => write!(f, "COMPLETED: {result}"),
            Reply::Status(state) => write!(f, "STATUS: {state}"),
            Reply::Canceled(id) => write!(f, "CANCELED: {id}"),
            Reply::NotFound => f.write_str("ERROR: Task not found"),
            Reply::InvalidFormat(Verb::Check) => {
                f.write_str("ERROR: Invalid Check command format. Use 'Check <task_id>'")
            }
            Reply::InvalidFormat(Verb::Cancel) => {
                f.write_str("ERROR: Invalid Cancel command format. Use 'Cancel <task_id>'")
            }
            Reply::Busy => f.write_str("ERROR: Agent busy, try again later"),
            Reply::StoreUnavailable => f.write_str("ERROR: Task store unavailable"),
            Reply::Unrecognized => f.write_str(
                "Unrecognized command. Send 'Execute' to start or 'Check <task_id>' to poll.",
            ),
        }
    }
}
