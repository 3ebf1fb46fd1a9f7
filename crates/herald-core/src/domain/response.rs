//! Normalized agent responses handed to caller logic.

use serde::{Deserialize, Serialize};

use super::{Reply, TaskEvent, TaskId, TaskState};

/// Everything a caller can receive from the agent, as one tagged type.
///
/// Synchronous replies become `Message`; task events become `StatusUpdate`
/// or, for the final event, `TerminalResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentResponse {
    Message {
        text: String,
    },
    StatusUpdate {
        task_id: TaskId,
        state: TaskState,
    },
    TerminalResult {
        task_id: TaskId,
        state: TaskState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl AgentResponse {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentResponse::TerminalResult { .. })
    }
}

impl From<&Reply> for AgentResponse {
    fn from(reply: &Reply) -> Self {
        AgentResponse::Message {
            text: reply.to_string(),
        }
    }
}

impl From<TaskEvent> for AgentResponse {
    fn from(event: TaskEvent) -> Self {
        if event.is_final {
            AgentResponse::TerminalResult {
                task_id: event.task_id,
                state: event.state,
                result: event.result,
                error: event.error,
            }
        } else {
            AgentResponse::StatusUpdate {
                task_id: event.task_id,
                state: event.state,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContextId;

    #[test]
    fn final_event_becomes_terminal_result() {
        let event = TaskEvent {
            task_id: TaskId::random(),
            context_id: ContextId::random(),
            state: TaskState::Failed,
            result: None,
            error: Some("nope".into()),
            is_final: true,
        };
        let response = AgentResponse::from(event);
        assert!(response.is_terminal());
        assert!(matches!(
            response,
            AgentResponse::TerminalResult { state: TaskState::Failed, error: Some(ref e), .. } if e == "nope"
        ));
    }

    #[test]
    fn tagged_json_shape() {
        let v = serde_json::to_value(AgentResponse::from(&Reply::NotFound)).unwrap();
        assert_eq!(v["kind"], "message");
        assert_eq!(v["text"], "ERROR: Task not found");
    }
}
