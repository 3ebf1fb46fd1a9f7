//! TaskRunner - ワーカーが受理済みタスク 1 件に対して行う処理
//!
//! # フロー
//! 1. submitted -> working（タスクが消えているか terminal なら止まる）
//! 2. タスクの cancel signal を渡して `WorkUnit` を実行
//! 3. working -> completed | failed | canceled
//!
//! 実行中に消えたタスクは lost update: ログに残し、再作成はしない。

use std::sync::Arc;

use super::cancel::CancelRegistry;
use super::ledger::TaskLedger;
use crate::domain::{TaskId, Transition};
use crate::error::LedgerError;
use crate::ports::{CancelSignal, WorkError, WorkUnit};

/// キューに積まれる 1 件の仕事
#[derive(Debug)]
pub struct WorkItem {
    pub task_id: TaskId,
    pub cancel: CancelSignal,
}

pub struct TaskRunner {
    ledger: Arc<TaskLedger>,
    work: Arc<dyn WorkUnit>,
    cancels: Arc<CancelRegistry>,
}

impl TaskRunner {
    pub fn new(ledger: Arc<TaskLedger>, work: Arc<dyn WorkUnit>, cancels: Arc<CancelRegistry>) -> Self {
        Self {
            ledger,
            work,
            cancels,
        }
    }

    pub async fn run(&self, item: WorkItem) {
        let task_id = item.task_id;
        self.process(item).await;
        self.cancels.remove(task_id).await;
    }

    async fn process(&self, item: WorkItem) {
        let WorkItem { task_id, cancel } = item;

        let task = match self.ledger.transition(task_id, Transition::Start).await {
            Ok(task) => task,
            Err(err) => {
                report(task_id, "start", err);
                return;
            }
        };

        let finish = match self.work.run(&task, cancel).await {
            Ok(result) => Transition::Complete(result),
            Err(WorkError::Failed(reason)) => {
                tracing::warn!(task_id = %task_id, error = %reason, "work failed");
                Transition::Fail(reason)
            }
            Err(WorkError::Canceled) => Transition::Cancel,
        };

        let stage = match finish {
            Transition::Complete(_) => "complete",
            Transition::Fail(_) => "fail",
            _ => "cancel",
        };
        if let Err(err) = self.ledger.transition(task_id, finish).await {
            report(task_id, stage, err);
        }
    }
}

fn report(task_id: TaskId, stage: &'static str, err: LedgerError) {
    match err {
        LedgerError::Missing(_) => {
            tracing::warn!(task_id = %task_id, stage, "lost update: task missing from store, not recreating");
        }
        LedgerError::Rejected(rejected) => {
            tracing::debug!(task_id = %task_id, stage, from = %rejected.from, "transition skipped: task already {}", rejected.from);
        }
        LedgerError::Store(store) => {
            tracing::error!(task_id = %task_id, stage, error = %store, "could not persist task transition");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event_hub::EventHub;
    use crate::domain::{ContextId, Task, TaskState};
    use crate::impls::{DelayedGreeting, InMemoryTaskStore};
    use crate::ports::SystemClock;
    use async_trait::async_trait;
    use std::time::Duration;
    use tracing_test::traced_test;

    struct Failing;

    #[async_trait]
    impl WorkUnit for Failing {
        async fn run(&self, _task: &Task, _cancel: CancelSignal) -> Result<String, WorkError> {
            Err(WorkError::Failed("disk on fire".into()))
        }
    }

    fn setup(work: Arc<dyn WorkUnit>) -> (Arc<TaskLedger>, TaskRunner) {
        let ledger = Arc::new(TaskLedger::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(EventHub::new()),
            Arc::new(SystemClock),
        ));
        let runner = TaskRunner::new(Arc::clone(&ledger), work, Arc::new(CancelRegistry::new()));
        (ledger, runner)
    }

    async fn seed(ledger: &TaskLedger) -> TaskId {
        let task = Task::submitted(TaskId::random(), ContextId::random(), chrono::Utc::now());
        let id = task.id;
        ledger.create(task).await.unwrap();
        id
    }

    #[tokio::test(start_paused = true)]
    async fn completes_with_work_result() {
        let (ledger, runner) = setup(Arc::new(DelayedGreeting::new(Duration::from_secs(1), "done")));
        let id = seed(&ledger).await;

        runner.run(WorkItem { task_id: id, cancel: CancelSignal::never() }).await;

        let task = ledger.get(id).await.unwrap().unwrap();
        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.result.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn work_failure_marks_task_failed() {
        let (ledger, runner) = setup(Arc::new(Failing));
        let id = seed(&ledger).await;

        runner.run(WorkItem { task_id: id, cancel: CancelSignal::never() }).await;

        let task = ledger.get(id).await.unwrap().unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.error.as_deref(), Some("disk on fire"));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn evicted_task_is_logged_not_recreated() {
        let (ledger, runner) = setup(Arc::new(DelayedGreeting::new(Duration::from_secs(2), "late")));
        let id = seed(&ledger).await;

        let handle = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                ledger.evict(id).await.unwrap();
            })
        };
        runner.run(WorkItem { task_id: id, cancel: CancelSignal::never() }).await;
        handle.await.unwrap();

        assert!(ledger.get(id).await.unwrap().is_none());
        assert!(logs_contain("lost update"));
    }
}
