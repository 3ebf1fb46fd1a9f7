//! TaskLedger - タスク記録への唯一の書き込み経路
//!
//! # 不変条件
//! - 変更は read -> validate -> save -> publish を 1 つのロック下で行う
//! - store とイベントストリームは遷移の順序について常に一致する
//! - terminal 状態は競合する書き込みで上書きされない

use std::sync::Arc;

use tokio::sync::Mutex;

use super::event_hub::{EventHub, TaskSubscription};
use crate::domain::{Task, TaskEvent, TaskId, Transition};
use crate::error::LedgerError;
use crate::ports::{Clock, StoreError, TaskStore};

pub struct TaskLedger {
    store: Arc<dyn TaskStore>,
    hub: Arc<EventHub>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl TaskLedger {
    pub fn new(store: Arc<dyn TaskStore>, hub: Arc<EventHub>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            hub,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// 新規タスクを保存して通知
    pub async fn create(&self, task: Task) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let event = TaskEvent::from_task(&task);
        self.store.save(task).await?;
        self.hub.publish(event).await;
        Ok(())
    }

    /// 保存済みタスクに `transition` を適用し、新しい状態を通知
    ///
    /// 更新後のスナップショットを返す。
    pub async fn transition(&self, id: TaskId, transition: Transition) -> Result<Task, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut task = self.store.get(id).await?.ok_or(LedgerError::Missing(id))?;
        task.apply(transition, self.clock.now())?;
        self.store.save(task.clone()).await?;
        self.hub.publish(TaskEvent::from_task(&task)).await;
        tracing::info!(task_id = %id, state = %task.state, "task transitioned");
        Ok(task)
    }

    pub async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.store.get(id).await
    }

    pub async fn subscribe(&self, id: TaskId) -> TaskSubscription {
        self.hub.subscribe(id).await
    }

    /// 保存済みタスクのみ購読する。未知の id は `None`
    ///
    /// - 書き込みロック下で lookup と subscribe を行う
    /// - 間に evict が挟まって孤立した topic が残ることはない
    pub async fn subscribe_existing(&self, id: TaskId) -> Result<Option<TaskSubscription>, StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.store.get(id).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.hub.subscribe(id).await))
    }

    /// タスクとそのイベント履歴を削除
    pub async fn evict(&self, id: TaskId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.delete(id).await?;
        self.hub.forget(id).await;
        Ok(())
    }
}
