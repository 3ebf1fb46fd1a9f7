//! TaskStore port - タスク記録の source of truth
//!
//! # 設計原則
//! - `save` は id で upsert。last writer wins だが書き込みは atomic
//! - 返す記録はスナップショット。live な参照は返さない
//! - 到達できないバックエンドは `StoreError::Unavailable`。"not found" にはしない

use async_trait::async_trait;

use crate::domain::{Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert or overwrite the record with `task.id`.
    async fn save(&self, task: Task) -> Result<(), StoreError>;

    /// Fetch a snapshot of the record, if any.
    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Remove the record. Absent ids are a no-op.
    async fn delete(&self, id: TaskId) -> Result<(), StoreError>;

    async fn list_ids(&self) -> Result<Vec<TaskId>, StoreError>;

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.list_ids().await?.len())
    }
}
