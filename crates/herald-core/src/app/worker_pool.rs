use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use super::runner::{TaskRunner, WorkItem};
use crate::error::SubmitError;

/// Bounded pool of task workers.
/// - `submit` は待たない: キューが満杯なら `QueueFull`
/// - `shutdown_and_join` で受付停止。実行中の item は最後まで走る
pub struct WorkerPool {
    tx: Mutex<Option<mpsc::Sender<WorkItem>>>,
    // ワーカー 0 本でも channel が閉じないよう pool 側でも保持する
    _rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    capacity: usize,
    shutdown_tx: watch::Sender<bool>,
    joins: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// `capacity` 枠のキューを共有する `n` 本のワーカーを起動
    pub fn spawn(n: usize, capacity: usize, runner: Arc<TaskRunner>) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let rx = Arc::clone(&rx);
            let runner = Arc::clone(&runner);
            let mut shutdown_rx = shutdown_rx.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, rx, runner, &mut shutdown_rx).await;
            }));
        }
        tracing::debug!(workers = n, capacity, "worker pool started");

        Self {
            tx: Mutex::new(Some(tx)),
            _rx: rx,
            capacity,
            shutdown_tx,
            joins: Mutex::new(joins),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn submit(&self, item: WorkItem) -> Result<(), SubmitError> {
        let tx = self.tx.lock().await;
        let Some(tx) = tx.as_ref() else {
            return Err(SubmitError::Closed);
        };
        tx.try_send(item).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    /// Stop taking new items. Workers exit after their current item.
    pub async fn request_shutdown(&self) {
        self.tx.lock().await.take();
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(&self) {
        self.request_shutdown().await;
        let joins = std::mem::take(&mut *self.joins.lock().await);
        for join in joins {
            if let Err(err) = join.await {
                tracing::error!(error = %err, "worker panicked");
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    runner: Arc<TaskRunner>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let item = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            item = async { rx.lock().await.recv().await } => item,
        };

        // sender dropped and queue drained
        let Some(item) = item else { break };

        tracing::debug!(worker_id, task_id = %item.task_id, "worker picked up task");
        runner.run(item).await;
    }
    tracing::debug!(worker_id, "worker stopped");
}
