//! AgentBuilder - 配線と起動時バリデーション

use std::sync::Arc;

use tokio::sync::watch;

use super::agent::Agent;
use super::cancel::CancelRegistry;
use super::event_hub::EventHub;
use super::eviction_loop::EvictionLoop;
use super::executor::AgentExecutor;
use super::ledger::TaskLedger;
use super::poller::Poller;
use super::runner::TaskRunner;
use super::worker_pool::WorkerPool;
use crate::config::AgentConfig;
use crate::error::HeraldError;
use crate::impls::{DelayedGreeting, InMemoryTaskStore};
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator, WorkUnit};

/// Builds an [`Agent`]. Every collaborator has an in-process default.
///
/// # Example
/// ```ignore
/// let agent = AgentBuilder::new()
///     .config(AgentConfig { workers: 4, ..Default::default() })
///     .build()?;
/// ```
///
/// `build` spawns the workers, so it must run inside a tokio runtime.
#[derive(Default)]
pub struct AgentBuilder {
    config: AgentConfig,
    store: Option<Arc<dyn TaskStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    work: Option<Arc<dyn WorkUnit>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Replace the default [`DelayedGreeting`] unit of work.
    pub fn work_unit(mut self, work: Arc<dyn WorkUnit>) -> Self {
        self.work = Some(work);
        self
    }

    /// Validate the config, then wire and start everything.
    pub fn build(self) -> Result<Agent, HeraldError> {
        let config = self.config;
        config.validate()?;

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let store: Arc<dyn TaskStore> = match self.store {
            Some(store) => store,
            None => Arc::new(InMemoryTaskStore::new()),
        };
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        };
        let work: Arc<dyn WorkUnit> = match self.work {
            Some(work) => work,
            None => Arc::new(DelayedGreeting::new(
                config.work_duration(),
                config.result_text.clone(),
            )),
        };

        let ledger = Arc::new(TaskLedger::new(store, Arc::new(EventHub::new()), clock));
        let cancels = Arc::new(CancelRegistry::new());
        let runner = Arc::new(TaskRunner::new(
            Arc::clone(&ledger),
            work,
            Arc::clone(&cancels),
        ));
        let pool = WorkerPool::spawn(config.workers, config.queue_capacity, runner);

        let eviction = config.retention().map(|retention| {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let join = EvictionLoop::new(Arc::clone(&ledger), retention, config.eviction_interval())
                .spawn(shutdown_rx);
            (shutdown_tx, join)
        });

        tracing::info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            work_duration_ms = config.work_duration_ms,
            retention_ms = ?config.retention_ms,
            "agent started"
        );

        let executor = Arc::new(AgentExecutor::new(ledger, ids, pool, cancels));
        Ok(Agent::new(executor, Poller::new(config.poll()), eviction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentResponse, TaskState};
    use crate::error::ConfigError;
    use crate::ports::FixedClock;
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::time::Duration;

    #[tokio::test]
    async fn build_rejects_zero_workers() {
        let result = AgentBuilder::new()
            .config(AgentConfig {
                workers: 0,
                ..Default::default()
            })
            .build();
        assert!(matches!(
            result,
            Err(HeraldError::Config(ConfigError::Zero("workers")))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_result_text_is_used() {
        let agent = AgentBuilder::new()
            .config(AgentConfig {
                work_duration_ms: 100,
                result_text: "custom".into(),
                ..Default::default()
            })
            .build()
            .unwrap();

        let id = agent.submit().await.unwrap();
        let task = agent.poll(id, |_| {}).await.unwrap();
        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.result.as_deref(), Some("custom"));

        agent.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn retention_starts_eviction() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let agent = AgentBuilder::new()
            .clock(clock.clone())
            .config(AgentConfig {
                work_duration_ms: 10,
                retention_ms: Some(500),
                eviction_interval_ms: 1000,
                ..Default::default()
            })
            .build()
            .unwrap();

        let id = agent.submit().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(agent.get_task(id).await.unwrap().is_some());

        clock.advance(TimeDelta::seconds(1));
        tokio::time::sleep(Duration::from_millis(1400)).await;

        assert!(agent.get_task(id).await.unwrap().is_none());
        assert_eq!(
            agent.send_message(&format!("Check {id}")).await,
            AgentResponse::Message {
                text: "ERROR: Task not found".into()
            }
        );
        agent.shutdown().await;
    }
}
