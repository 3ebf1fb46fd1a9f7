//! Task - 1 件の仕事についての唯一の記録

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ContextId, TaskId, TaskState};

/// Metadata key under which the executor keeps the request text.
pub const ORIGINAL_REQUEST_KEY: &str = "original_request";

/// A state change requested on a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A worker picked the task up.
    Start,
    /// Work finished with a result payload.
    Complete(String),
    /// Work failed; the string describes why.
    Fail(String),
    /// Cancellation was requested.
    Cancel,
}

impl Transition {
    pub fn target(&self) -> TaskState {
        match self {
            Transition::Start => TaskState::Working,
            Transition::Complete(_) => TaskState::Completed,
            Transition::Fail(_) => TaskState::Failed,
            Transition::Cancel => TaskState::Canceled,
        }
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition from {from} to {to} for task {task_id}")]
pub struct TransitionError {
    pub task_id: TaskId,
    pub from: TaskState,
    pub to: TaskState,
}

/// One unit of asynchronous work.
///
/// Records handed out by a [`TaskStore`](crate::ports::TaskStore) are
/// snapshots: mutate a copy through [`Task::apply`] and save it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub context_id: ContextId,
    pub state: TaskState,

    /// Set only when `state == Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Set only when `state == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A fresh task in `Submitted`.
    pub fn submitted(id: TaskId, context_id: ContextId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            context_id,
            state: TaskState::Submitted,
            result: None,
            error: None,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The request text the task was created from, if recorded.
    pub fn original_request(&self) -> Option<&str> {
        self.metadata
            .get(ORIGINAL_REQUEST_KEY)
            .and_then(Value::as_str)
    }

    /// Apply a transition, enforcing forward-only progress.
    pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<(), TransitionError> {
        let to = transition.target();
        if !self.state.can_transition_to(to) {
            return Err(TransitionError {
                task_id: self.id,
                from: self.state,
                to,
            });
        }

        match transition {
            Transition::Start | Transition::Cancel => {}
            Transition::Complete(result) => self.result = Some(result),
            Transition::Fail(error) => self.error = Some(error),
        }
        self.state = to;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, secs).unwrap()
    }

    fn new_task() -> Task {
        Task::submitted(TaskId::random(), ContextId::random(), at(0))
            .with_metadata(ORIGINAL_REQUEST_KEY, "Execute")
    }

    #[test]
    fn new_task_starts_submitted() {
        let task = new_task();
        assert_eq!(task.state, TaskState::Submitted);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.original_request(), Some("Execute"));
    }

    #[test]
    fn complete_sets_result_and_timestamp() {
        let mut task = new_task();
        task.apply(Transition::Start, at(1)).unwrap();
        task.apply(Transition::Complete("done".into()), at(2)).unwrap();

        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.result.as_deref(), Some("done"));
        assert!(task.error.is_none());
        assert_eq!(task.updated_at, at(2));
        assert_eq!(task.created_at, at(0));
    }

    #[test]
    fn fail_sets_error_only() {
        let mut task = new_task();
        task.apply(Transition::Fail("boom".into()), at(1)).unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));
        assert!(task.result.is_none());
    }

    #[test]
    fn terminal_task_rejects_and_stays_untouched() {
        let mut task = new_task();
        task.apply(Transition::Cancel, at(1)).unwrap();
        let before = task.clone();

        let err = task
            .apply(Transition::Complete("late".into()), at(5))
            .unwrap_err();
        assert_eq!(err.from, TaskState::Canceled);
        assert_eq!(err.to, TaskState::Completed);
        assert_eq!(task, before);
    }

    #[test]
    fn json_shape_omits_empty_fields() {
        let task = Task::submitted(TaskId::random(), ContextId::random(), at(0));
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["state"], "submitted");
        assert!(v.get("result").is_none());
        assert!(v.get("metadata").is_none());
    }
}
