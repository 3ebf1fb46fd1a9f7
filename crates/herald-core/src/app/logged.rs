//! LoggedHandler - traffic logging around any `CommandHandler`.

use std::time::Instant;

use async_trait::async_trait;

use super::executor::CommandHandler;
use crate::domain::Reply;

pub struct LoggedHandler<H> {
    inner: H,
}

impl<H: CommandHandler> LoggedHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for LoggedHandler<H> {
    async fn handle(&self, text: &str) -> Reply {
        tracing::info!(command = text.trim(), "inbound command");
        let started = Instant::now();
        let reply = self.inner.handle(text).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if reply.is_error() {
            tracing::warn!(reply = %reply, elapsed_ms, "outbound reply");
        } else {
            tracing::info!(reply = %reply, elapsed_ms, "outbound reply");
        }
        reply
    }
}
