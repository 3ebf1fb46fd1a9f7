//! Cancel - 実行中タスクへのキャンセル signal

use std::collections::HashMap;

use tokio::sync::{Mutex, watch};

use crate::domain::TaskId;
use crate::ports::CancelSignal;

/// 受理済みタスクごとに `watch` sender を 1 つ持つ。ワーカー終了時に削除
#[derive(Default)]
pub struct CancelRegistry {
    senders: Mutex<HashMap<TaskId, watch::Sender<bool>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: TaskId) -> CancelSignal {
        let (tx, rx) = watch::channel(false);
        self.senders.lock().await.insert(id, tx);
        CancelSignal::new(rx)
    }

    /// Fire the signal for `id`. Returns whether a running task was signaled.
    pub async fn fire(&self, id: TaskId) -> bool {
        match self.senders.lock().await.remove(&id) {
            Some(tx) => tx.send(true).is_ok(),
            None => false,
        }
    }

    pub async fn remove(&self, id: TaskId) {
        self.senders.lock().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.senders.lock().await.len()
    }
}
