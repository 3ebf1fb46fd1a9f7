//! herald-core
//!
//! Task store, dispatch executor and event channel for the agent-to-agent
//! task pattern.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, state, task, command, reply, events）
//! - **ports**: 抽象化レイヤー（TaskStore, WorkUnit, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（ledger, executor, worker pool, poller, event hub, agent）
//! - **impls**: 実装（in-memory store, デフォルトの仕事）
//! - **config**: AgentConfig（YAML + `HERALD_*` env）

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{Agent, AgentBuilder, ResponseStream};
pub use config::AgentConfig;
pub use domain::{AgentResponse, Reply, Task, TaskEvent, TaskId, TaskState};
pub use error::HeraldError;
