//! Poller - pull モードでのタスク観測
//!
//! - 各 poll は現在の記録への独立した問い合わせ。何も消費しない
//! - 最初の terminal 状態で止まる
//! - deadline を過ぎたら `PollError::TimedOut`

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::{Task, TaskId};
use crate::error::PollError;
use crate::ports::StoreError;

/// タスク記録の読み取り口
#[async_trait]
pub trait TaskQuery: Send + Sync {
    async fn task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Poll `id` until it reaches a terminal state.
    ///
    /// `observe` sees every snapshot, including the terminal one.
    pub async fn wait_for_terminal<Q, F>(
        &self,
        query: &Q,
        id: TaskId,
        mut observe: F,
    ) -> Result<Task, PollError>
    where
        Q: TaskQuery + ?Sized,
        F: FnMut(&Task) + Send,
    {
        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);

        loop {
            let task = query.task(id).await?.ok_or(PollError::NotFound(id))?;
            observe(&task);
            if task.state.is_terminal() {
                return Ok(task);
            }

            let mut next = Instant::now() + self.config.interval;
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(PollError::TimedOut {
                        task_id: id,
                        last_state: task.state,
                    });
                }
                next = next.min(deadline);
            }
            tracing::trace!(task_id = %id, state = %task.state, "task not finished, polling again");
            tokio::time::sleep_until(next).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContextId, TaskState, Transition};
    use chrono::Utc;
    use std::sync::Mutex;

    /// Returns scripted states, one per call, repeating the last.
    struct Scripted {
        task: Task,
        states: Mutex<Vec<TaskState>>,
    }

    impl Scripted {
        fn new(mut states: Vec<TaskState>) -> Self {
            states.reverse();
            Self {
                task: Task::submitted(TaskId::random(), ContextId::random(), Utc::now()),
                states: Mutex::new(states),
            }
        }
    }

    #[async_trait]
    impl TaskQuery for Scripted {
        async fn task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
            if id != self.task.id {
                return Ok(None);
            }
            let mut states = self.states.lock().unwrap();
            let state = if states.len() > 1 {
                states.pop().unwrap()
            } else {
                states[0]
            };
            let mut task = self.task.clone();
            match state {
                TaskState::Submitted => {}
                TaskState::Working => task.apply(Transition::Start, Utc::now()).unwrap(),
                TaskState::Completed => task
                    .apply(Transition::Complete("done".into()), Utc::now())
                    .unwrap(),
                TaskState::Failed => task.apply(Transition::Fail("x".into()), Utc::now()).unwrap(),
                TaskState::Canceled => task.apply(Transition::Cancel, Utc::now()).unwrap(),
            }
            Ok(Some(task))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_terminal_state() {
        let query = Scripted::new(vec![
            TaskState::Submitted,
            TaskState::Working,
            TaskState::Completed,
        ]);
        let mut seen = Vec::new();
        let start = Instant::now();

        let task = Poller::default()
            .wait_for_terminal(&query, query.task.id, |t| seen.push(t.state))
            .await
            .unwrap();

        assert_eq!(task.result.as_deref(), Some("done"));
        assert_eq!(
            seen,
            vec![TaskState::Submitted, TaskState::Working, TaskState::Completed]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_last_state() {
        let query = Scripted::new(vec![TaskState::Working]);
        let poller = Poller::new(PollConfig {
            interval: Duration::from_secs(1),
            timeout: Some(Duration::from_millis(2500)),
        });

        let err = poller
            .wait_for_terminal(&query, query.task.id, |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PollError::TimedOut {
                task_id: query.task.id,
                last_state: TaskState::Working,
            }
        );
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let query = Scripted::new(vec![TaskState::Working]);
        let id = TaskId::random();
        let err = Poller::default()
            .wait_for_terminal(&query, id, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, PollError::NotFound(id));
    }
}
