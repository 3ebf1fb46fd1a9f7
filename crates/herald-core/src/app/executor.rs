//! AgentExecutor - 受信したコマンド文字列を Reply に変換
//!
//! # フロー
//! - `Execute`: submitted タスクを作成し、仕事をキューに積み、id を返す
//! - `Check <id>`: 記録を読む
//! - `Cancel <id>`: タスクを `canceled` にして signal を発火
//!
//! リクエスト経路での変更は作成とキャンセルのみ。
//! ワーカー側の変更もすべて同じ `TaskLedger` を通る。

use std::sync::Arc;

use async_trait::async_trait;

use super::cancel::CancelRegistry;
use super::event_hub::TaskSubscription;
use super::ledger::TaskLedger;
use super::poller::TaskQuery;
use super::runner::WorkItem;
use super::worker_pool::WorkerPool;
use crate::domain::{Command, ORIGINAL_REQUEST_KEY, Reply, Task, TaskId, TaskState, Transition};
use crate::error::{HeraldError, LedgerError, SubmitError};
use crate::observability::StateCounts;
use crate::ports::{Clock, IdGenerator, StoreError};

/// コマンド文字列に `Reply` で答えるもの
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, text: &str) -> Reply;
}

#[async_trait]
impl<T: CommandHandler + ?Sized> CommandHandler for Arc<T> {
    async fn handle(&self, text: &str) -> Reply {
        (**self).handle(text).await
    }
}

pub struct AgentExecutor {
    ledger: Arc<TaskLedger>,
    ids: Arc<dyn IdGenerator>,
    pool: WorkerPool,
    cancels: Arc<CancelRegistry>,
}

impl AgentExecutor {
    pub fn new(
        ledger: Arc<TaskLedger>,
        ids: Arc<dyn IdGenerator>,
        pool: WorkerPool,
        cancels: Arc<CancelRegistry>,
    ) -> Self {
        Self {
            ledger,
            ids,
            pool,
            cancels,
        }
    }

    pub fn ledger(&self) -> &Arc<TaskLedger> {
        &self.ledger
    }

    /// `request` のタスクを作成して仕事をキューに積む
    ///
    /// - キューが拒否した場合は返る前にタスクを failed にする
    /// - `submitted` のまま放置されるタスクは作らない
    pub async fn submit(&self, request: &str) -> Result<TaskId, HeraldError> {
        let task_id = self.ids.generate_task_id();
        let task = Task::submitted(task_id, self.ids.generate_context_id(), self.ledger.clock().now())
            .with_metadata(ORIGINAL_REQUEST_KEY, request);
        self.ledger.create(task).await?;

        let cancel = self.cancels.register(task_id).await;
        if let Err(err) = self.pool.submit(WorkItem { task_id, cancel }).await {
            self.cancels.remove(task_id).await;
            let reason = match err {
                SubmitError::QueueFull { .. } => "work queue full",
                SubmitError::Closed => "worker pool is shut down",
            };
            tracing::warn!(task_id = %task_id, error = %err, "work rejected, failing task");
            if let Err(fail_err) = self.ledger.transition(task_id, Transition::Fail(reason.into())).await {
                tracing::error!(task_id = %task_id, error = %fail_err, "could not fail rejected task");
            }
            return Err(err.into());
        }

        tracing::info!(task_id = %task_id, "task accepted");
        Ok(task_id)
    }

    pub async fn check(&self, raw_id: &str) -> Reply {
        let Ok(task_id) = raw_id.parse::<TaskId>() else {
            return Reply::NotFound;
        };
        match self.ledger.get(task_id).await {
            Ok(Some(task)) => match task.state {
                TaskState::Completed => Reply::Completed(task.result.unwrap_or_default()),
                state => Reply::Status(state),
            },
            Ok(None) => Reply::NotFound,
            Err(err) => store_unavailable(&err),
        }
    }

    pub async fn cancel(&self, raw_id: &str) -> Reply {
        let Ok(task_id) = raw_id.parse::<TaskId>() else {
            return Reply::NotFound;
        };
        match self.ledger.transition(task_id, Transition::Cancel).await {
            Ok(_) => {
                self.cancels.fire(task_id).await;
                Reply::Canceled(task_id)
            }
            Err(LedgerError::Missing(_)) => Reply::NotFound,
            Err(LedgerError::Rejected(rejected)) => Reply::Status(rejected.from),
            Err(LedgerError::Store(err)) => store_unavailable(&err),
        }
    }

    /// 既知タスクのイベントを購読。未知の id は `None`
    pub async fn subscribe(&self, task_id: TaskId) -> Result<Option<TaskSubscription>, StoreError> {
        self.ledger.subscribe_existing(task_id).await
    }

    pub async fn counts(&self) -> Result<StateCounts, StoreError> {
        let mut counts = StateCounts::default();
        for id in self.ledger.store().list_ids().await? {
            if let Some(task) = self.ledger.get(id).await? {
                counts.record(task.state);
            }
        }
        Ok(counts)
    }

    /// 受付を止め、実行中タスクを待つ
    pub async fn shutdown(&self) {
        self.pool.shutdown_and_join().await;
    }
}

fn store_unavailable(err: &StoreError) -> Reply {
    tracing::error!(error = %err, "task store unavailable");
    Reply::StoreUnavailable
}

#[async_trait]
impl CommandHandler for AgentExecutor {
    async fn handle(&self, text: &str) -> Reply {
        match Command::parse(text) {
            Command::Execute => match self.submit(text.trim()).await {
                Ok(task_id) => Reply::Accepted(task_id),
                Err(HeraldError::Submit(_)) => Reply::Busy,
                Err(err) => {
                    tracing::error!(error = %err, "execute failed");
                    Reply::StoreUnavailable
                }
            },
            Command::Check(id) => self.check(&id).await,
            Command::Cancel(id) => self.cancel(&id).await,
            Command::MissingArgument(verb) => Reply::InvalidFormat(verb),
            Command::Unrecognized => Reply::Unrecognized,
        }
    }
}

#[async_trait]
impl TaskQuery for AgentExecutor {
    async fn task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.ledger.get(id).await
    }
}
