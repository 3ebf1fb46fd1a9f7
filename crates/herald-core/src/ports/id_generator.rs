//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース、UUID 表記で出力（本番用）

use crate::domain::ids::{ContextId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;
use uuid::Uuid;

/// 新規タスクの ID を生成
///
/// # Thread Safety
/// - `Send + Sync` so one generator can be shared by every request path
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_context_id(&self) -> ContextId;
}

/// ULID-based generator.
///
/// The timestamp half comes from the injected `Clock`, the rest is random,
/// so ids sort by creation time and a `FixedClock` gives a fixed prefix.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_uuid(&self) -> Uuid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Uuid::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from_uuid(self.next_uuid())
    }

    fn generate_context_id(&self) -> ContextId {
        ContextId::from_uuid(self.next_uuid())
    }
}
