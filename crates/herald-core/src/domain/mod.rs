//! Domain model (ids, task state machine, commands, replies, events).

pub mod command;
pub mod events;
pub mod ids;
pub mod reply;
pub mod response;
pub mod state;
pub mod task;

pub use command::{Command, Verb};
pub use events::TaskEvent;
pub use ids::{ContextId, ParseIdError, TaskId};
pub use reply::Reply;
pub use response::AgentResponse;
pub use state::TaskState;
pub use task::{ORIGINAL_REQUEST_KEY, Task, Transition, TransitionError};
