//! InMemoryTaskStore - プロセス内タスクストア

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Task, TaskId};
use crate::ports::{StoreError, TaskStore};

/// Task store backed by a `HashMap` behind an async `RwLock`.
///
/// Every operation takes the lock for the duration of a single map access,
/// so writes are atomic and readers only ever see whole records. The lock is
/// never held across an await point outside this module.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn save(&self, task: Task) -> Result<(), StoreError> {
        tracing::trace!(task_id = %task.id, state = %task.state, "store save");
        self.tasks.write().await.insert(task.id, task);
        Ok(())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        if self.tasks.write().await.remove(&id).is_some() {
            tracing::trace!(task_id = %id, "store delete");
        }
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<TaskId>, StoreError> {
        Ok(self.tasks.read().await.keys().copied().collect())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.tasks.read().await.len())
    }
}
