//! EventHub - タスクごとの状態遷移イベント配信
//!
//! # 動作
//! - タスクごとに topic を持つ（これまでの履歴 + live subscriber）
//! - 新しい subscriber には履歴を先に replay する。遅れて購読しても同じ順序・同じ結果を観測できる
//! - final イベントの後は topic を閉じる: live subscription はバッファを読み切って終了し、以降の publish は捨てる

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

use crate::domain::{TaskEvent, TaskId};

#[derive(Default)]
struct Topic {
    history: Vec<TaskEvent>,
    subscribers: Vec<mpsc::UnboundedSender<TaskEvent>>,
    closed: bool,
}

#[derive(Default)]
pub struct EventHub {
    topics: Mutex<HashMap<TaskId, Topic>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// `event` をタスクの topic に publish
    ///
    /// topic が既に閉じていれば（terminal イベント配信済み）何も届けず `false` を返す。
    pub async fn publish(&self, event: TaskEvent) -> bool {
        let mut topics = self.topics.lock().await;
        let topic = topics.entry(event.task_id).or_default();
        if topic.closed {
            tracing::debug!(task_id = %event.task_id, state = %event.state, "dropping event on closed topic");
            return false;
        }

        topic
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());

        if event.is_final {
            topic.closed = true;
            topic.subscribers.clear();
        }
        topic.history.push(event);
        true
    }

    /// 最初に publish されたイベントから購読
    pub async fn subscribe(&self, task_id: TaskId) -> TaskSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = self.topics.lock().await;
        let topic = topics.entry(task_id).or_default();

        for event in &topic.history {
            // rx is alive in this scope
            let _ = tx.send(event.clone());
        }
        if !topic.closed {
            topic.subscribers.push(tx);
        }

        TaskSubscription { task_id, rx }
    }

    /// topic を破棄。live subscription は読み切った後に終わる
    pub async fn forget(&self, task_id: TaskId) {
        self.topics.lock().await.remove(&task_id);
    }

    pub async fn has_topic(&self, task_id: TaskId) -> bool {
        self.topics.lock().await.contains_key(&task_id)
    }

    /// Events published so far for a task.
    pub async fn history(&self, task_id: TaskId) -> Vec<TaskEvent> {
        self.topics
            .lock()
            .await
            .get(&task_id)
            .map(|topic| topic.history.clone())
            .unwrap_or_default()
    }
}

/// Receiving side of one subscription.
#[derive(Debug)]
pub struct TaskSubscription {
    task_id: TaskId,
    rx: mpsc::UnboundedReceiver<TaskEvent>,
}

impl TaskSubscription {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Next event, or `None` once the final event has been consumed.
    pub async fn next(&mut self) -> Option<TaskEvent> {
        self.rx.recv().await
    }

    /// Consume the remainder of the stream.
    pub async fn collect(mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}
