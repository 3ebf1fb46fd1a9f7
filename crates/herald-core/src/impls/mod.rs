//! Impls - port の具象実装
//!
//! # 含まれるもの
//! - **InMemoryTaskStore**: プロセス内の `TaskStore`
//! - **DelayedGreeting**: デフォルトの `WorkUnit`（sleep して固定結果）
//!
//! 永続 store は同じ trait の裏で別 crate に置く。

pub mod delayed_greeting;
pub mod memory_store;

pub use self::delayed_greeting::{DEFAULT_RESULT, DelayedGreeting};
pub use self::memory_store::InMemoryTaskStore;
