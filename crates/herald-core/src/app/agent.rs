//! Agent - 呼び出し側に見える面
//!
//! 同じタスク記録に対して 3 通りの使い方:
//! - `send_message`: 1 コマンド 1 レスポンス
//! - `submit` + `poll`: 仕事を受理させ、間隔を空けて状態を取りに行く
//! - `send_streaming`: reply の後にタスクのイベントが続く

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::event_hub::TaskSubscription;
use super::executor::{AgentExecutor, CommandHandler};
use super::logged::LoggedHandler;
use super::poller::Poller;
use crate::domain::{AgentResponse, Reply, Task, TaskId};
use crate::error::HeraldError;
use crate::observability::StateCounts;

/// Stop switch and handle of a background loop.
struct Background {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

pub struct Agent {
    executor: Arc<AgentExecutor>,
    handler: LoggedHandler<Arc<AgentExecutor>>,
    poller: Poller,
    eviction: Mutex<Option<Background>>,
}

impl Agent {
    pub(crate) fn new(
        executor: Arc<AgentExecutor>,
        poller: Poller,
        eviction: Option<(watch::Sender<bool>, JoinHandle<()>)>,
    ) -> Self {
        Self {
            handler: LoggedHandler::new(Arc::clone(&executor)),
            executor,
            poller,
            eviction: Mutex::new(eviction.map(|(shutdown_tx, join)| Background { shutdown_tx, join })),
        }
    }

    pub fn executor(&self) -> &Arc<AgentExecutor> {
        &self.executor
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// Answer one command with its raw reply.
    pub async fn handle(&self, text: &str) -> Reply {
        self.handler.handle(text).await
    }

    pub async fn send_message(&self, text: &str) -> AgentResponse {
        AgentResponse::from(&self.handle(text).await)
    }

    /// Start a task directly, without going through command text.
    pub async fn submit(&self) -> Result<TaskId, HeraldError> {
        self.executor.submit("Execute").await
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Option<Task>, HeraldError> {
        Ok(self.executor.ledger().get(id).await?)
    }

    /// Poll `id` until it finishes, handing each snapshot to `observe`.
    pub async fn poll<F>(&self, id: TaskId, observe: F) -> Result<Task, HeraldError>
    where
        F: FnMut(&Task) + Send,
    {
        Ok(self
            .poller
            .wait_for_terminal(self.executor.as_ref(), id, observe)
            .await?)
    }

    pub async fn subscribe(&self, id: TaskId) -> Result<Option<TaskSubscription>, HeraldError> {
        Ok(self.executor.subscribe(id).await?)
    }

    /// Send a command and stream the outcome.
    ///
    /// The stream starts with the reply message. For an accepted task it then
    /// yields every state change up to and including the terminal result.
    pub async fn send_streaming(&self, text: &str) -> ResponseStream {
        let reply = self.handle(text).await;
        let events = match &reply {
            Reply::Accepted(task_id) => match self.executor.subscribe(*task_id).await {
                Ok(subscription) => subscription,
                Err(err) => {
                    tracing::warn!(task_id = %task_id, error = %err, "could not subscribe to accepted task");
                    None
                }
            },
            _ => None,
        };
        ResponseStream {
            first: Some(AgentResponse::from(&reply)),
            events,
        }
    }

    pub async fn counts(&self) -> Result<StateCounts, HeraldError> {
        Ok(self.executor.counts().await?)
    }

    /// Stop background loops, stop intake, and wait for in-flight work.
    pub async fn shutdown(&self) {
        if let Some(eviction) = self.eviction.lock().await.take() {
            // the loop may already have exited
            let _ = eviction.shutdown_tx.send(true);
            if let Err(err) = eviction.join.await {
                tracing::error!(error = %err, "eviction loop panicked");
            }
        }
        self.executor.shutdown().await;
        tracing::info!("agent stopped");
    }
}

/// Responses produced by [`Agent::send_streaming`].
#[derive(Debug)]
pub struct ResponseStream {
    first: Option<AgentResponse>,
    events: Option<TaskSubscription>,
}

impl ResponseStream {
    pub async fn next(&mut self) -> Option<AgentResponse> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        let event = self.events.as_mut()?.next().await;
        if event.is_none() {
            self.events = None;
        }
        event.map(AgentResponse::from)
    }

    pub async fn collect(mut self) -> Vec<AgentResponse> {
        let mut responses = Vec::new();
        while let Some(response) = self.next().await {
            responses.push(response);
        }
        responses
    }
}
