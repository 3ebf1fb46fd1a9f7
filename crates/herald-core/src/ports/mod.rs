//! Ports - 抽象化層
//!
//! application 層が話しかける継ぎ目。store、clock、ID 生成、実際の仕事を
//! 差し替えられる（in-memory / 永続、実時間 / 固定時間、デモ / 本番）。

pub mod clock;
pub mod id_generator;
pub mod task_store;
pub mod work;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::{StoreError, TaskStore};
pub use self::work::{CancelSignal, WorkError, WorkUnit};
