//! EvictionLoop - 保持期間を過ぎた完了タスクの削除
//!
//! # フロー
//! 1. `interval` ごとに保存済みタスクの id を列挙
//! 2. `updated_at` が `now - retention` より古い terminal タスクを evict
//! 3. 非 terminal タスクには触れない

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::ledger::TaskLedger;
use crate::ports::{Clock, StoreError};

pub struct EvictionLoop {
    ledger: Arc<TaskLedger>,
    retention: Duration,
    interval: Duration,
}

impl EvictionLoop {
    pub fn new(ledger: Arc<TaskLedger>, retention: Duration, interval: Duration) -> Self {
        Self {
            ledger,
            retention,
            interval,
        }
    }

    /// 1 回分の掃除。evict した件数を返す
    pub async fn sweep(&self) -> Result<usize, StoreError> {
        // a retention too large to represent never expires anything
        let Some(cutoff) = chrono::TimeDelta::from_std(self.retention)
            .ok()
            .and_then(|retention| self.ledger.clock().now().checked_sub_signed(retention))
        else {
            return Ok(0);
        };

        let mut evicted = 0;
        for id in self.ledger.store().list_ids().await? {
            let Some(task) = self.ledger.get(id).await? else {
                continue;
            };
            if task.state.is_terminal() && task.updated_at < cutoff {
                self.ledger.evict(id).await?;
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::info!(evicted, "evicted finished tasks");
        }
        Ok(evicted)
    }

    /// Run `sweep` every interval until `shutdown_rx` flips or closes.
    pub fn spawn(self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = self.sweep().await {
                            tracing::warn!(error = %err, "eviction sweep failed");
                        }
                    }
                }
            }
            tracing::debug!("eviction loop stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event_hub::EventHub;
    use crate::domain::{ContextId, Task, TaskId, Transition};
    use crate::impls::InMemoryTaskStore;
    use crate::ports::FixedClock;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn setup() -> (Arc<FixedClock>, Arc<TaskLedger>) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let ledger = Arc::new(TaskLedger::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(EventHub::new()),
            clock.clone(),
        ));
        (clock, ledger)
    }

    async fn seed(ledger: &TaskLedger) -> TaskId {
        let task = Task::submitted(TaskId::random(), ContextId::random(), ledger.clock().now());
        let id = task.id;
        ledger.create(task).await.unwrap();
        id
    }

    #[tokio::test]
    async fn evicts_only_old_terminal_tasks() {
        let (clock, ledger) = setup();
        let old_done = seed(&ledger).await;
        ledger
            .transition(old_done, Transition::Complete("x".into()))
            .await
            .unwrap();
        let old_running = seed(&ledger).await;
        ledger.transition(old_running, Transition::Start).await.unwrap();

        clock.advance(TimeDelta::minutes(10));
        let fresh_done = seed(&ledger).await;
        ledger.transition(fresh_done, Transition::Cancel).await.unwrap();

        let eviction = EvictionLoop::new(
            Arc::clone(&ledger),
            Duration::from_secs(300),
            Duration::from_secs(30),
        );
        assert_eq!(eviction.sweep().await.unwrap(), 1);

        assert!(ledger.get(old_done).await.unwrap().is_none());
        assert!(ledger.get(old_running).await.unwrap().is_some());
        assert!(ledger.get(fresh_done).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn background_loop_sweeps_and_stops() {
        let (clock, ledger) = setup();
        let id = seed(&ledger).await;
        ledger.transition(id, Transition::Fail("boom".into())).await.unwrap();
        clock.advance(TimeDelta::hours(1));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = EvictionLoop::new(
            Arc::clone(&ledger),
            Duration::from_secs(60),
            Duration::from_secs(30),
        )
        .spawn(shutdown_rx);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(ledger.get(id).await.unwrap().is_none());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
