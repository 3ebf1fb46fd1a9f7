//! WorkUnit port - ワーカーが 1 タスクに対して行う計算

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::Task;

/// Why a unit of work did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkError {
    #[error("{0}")]
    Failed(String),

    #[error("canceled")]
    Canceled,
}

/// Cooperative cancellation signal handed to a running unit of work.
///
/// Work is expected to poll [`is_canceled`](Self::is_canceled) or race
/// [`canceled`](Self::canceled) against its own progress.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_canceled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested. Pends forever if the sender
    /// is dropped without firing.
    pub async fn canceled(&mut self) {
        let fired = match self.rx.as_mut() {
            Some(rx) => rx.wait_for(|fired| *fired).await.is_ok(),
            None => false,
        };
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

/// A handler for accepted tasks.
///
/// `task` is a snapshot taken when the worker moved it to `working`.
#[async_trait]
pub trait WorkUnit: Send + Sync {
    async fn run(&self, task: &Task, cancel: CancelSignal) -> Result<String, WorkError>;
}
