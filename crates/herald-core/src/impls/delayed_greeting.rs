//! DelayedGreeting - デフォルトの仕事
//!
//! 実計算の代わり: 固定時間待ってから固定の結果を返す。
//! 待機はタスクの cancel signal と競争させる。

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Task;
use crate::ports::{CancelSignal, WorkError, WorkUnit};

pub const DEFAULT_RESULT: &str = "Hello World from Background Worker!";

#[derive(Debug, Clone)]
pub struct DelayedGreeting {
    delay: Duration,
    result: String,
}

impl DelayedGreeting {
    pub fn new(delay: Duration, result: impl Into<String>) -> Self {
        Self {
            delay,
            result: result.into(),
        }
    }
}

impl Default for DelayedGreeting {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), DEFAULT_RESULT)
    }
}

#[async_trait]
impl WorkUnit for DelayedGreeting {
    async fn run(&self, task: &Task, mut cancel: CancelSignal) -> Result<String, WorkError> {
        tracing::debug!(task_id = %task.id, delay_ms = self.delay.as_millis() as u64, "greeting work started");
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => Ok(self.result.clone()),
            _ = cancel.canceled() => Err(WorkError::Canceled),
        }
    }
}
