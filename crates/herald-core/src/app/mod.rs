//! App - アプリケーション層
//!
//! ports を組み合わせて agent を組み立てる。
//!
//! # 主要コンポーネント
//! - **AgentBuilder**: 配線と起動時バリデーション
//! - **Agent**: 呼び出し側の表面（send, submit + poll, stream）
//! - **AgentExecutor**: コマンドのディスパッチ
//! - **TaskLedger**: read -> validate -> save -> publish の直列化
//! - **EventHub**: replay 付きのタスク別イベント topic
//! - **WorkerPool** / **TaskRunner**: 上限付きのバックグラウンド実行
//! - **Poller**: pull モードでの観測
//! - **EvictionLoop**: 完了タスクの保持期間管理

pub mod agent;
pub mod builder;
pub mod cancel;
pub mod event_hub;
pub mod eviction_loop;
pub mod executor;
pub mod ledger;
pub mod logged;
pub mod poller;
pub mod runner;
pub mod worker_pool;

pub use self::agent::{Agent, ResponseStream};
pub use self::builder::AgentBuilder;
pub use self::cancel::CancelRegistry;
pub use self::event_hub::{EventHub, TaskSubscription};
pub use self::eviction_loop::EvictionLoop;
pub use self::executor::{AgentExecutor, CommandHandler};
pub use self::ledger::TaskLedger;
pub use self::logged::LoggedHandler;
pub use self::poller::{PollConfig, Poller, TaskQuery};
pub use self::runner::{TaskRunner, WorkItem};
pub use self::worker_pool::WorkerPool;
