use std::time::Duration;

use herald_core::domain::Reply;
use herald_core::{Agent, AgentBuilder, AgentConfig, AgentResponse, TaskId, TaskState};

fn agent() -> Agent {
    AgentBuilder::new()
        .config(AgentConfig {
            workers: 2,
            work_duration_ms: 1000,
            result_text: "streamed".into(),
            ..Default::default()
        })
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn stream_yields_ack_then_transitions_then_one_terminal_result() {
    let agent = agent();
    let responses = agent.send_streaming("Execute").await.collect().await;

    let AgentResponse::Message { text } = &responses[0] else {
        panic!("first response should be the ack: {responses:?}");
    };
    let task_id: TaskId = text
        .trim_start_matches("Task Accepted. ID: ")
        .parse()
        .unwrap();

    let states: Vec<_> = responses[1..]
        .iter()
        .map(|r| match r {
            AgentResponse::StatusUpdate { state, .. } | AgentResponse::TerminalResult { state, .. } => *state,
            AgentResponse::Message { text } => panic!("unexpected message {text}"),
        })
        .collect();
    assert_eq!(
        states,
        vec![TaskState::Submitted, TaskState::Working, TaskState::Completed]
    );
    assert_eq!(responses.iter().filter(|r| r.is_terminal()).count(), 1);
    assert_eq!(
        responses.last(),
        Some(&AgentResponse::TerminalResult {
            task_id,
            state: TaskState::Completed,
            result: Some("streamed".into()),
            error: None,
        })
    );
    agent.shutdown().await;
}

#[tokio::test]
async fn non_execute_stream_is_a_single_message() {
    let agent = agent();
    let responses = agent.send_streaming("Check nope").await.collect().await;
    assert_eq!(
        responses,
        vec![AgentResponse::Message {
            text: "ERROR: Task not found".into()
        }]
    );
    agent.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn late_subscriber_sees_same_outcome_as_poller() {
    let agent = agent();
    let id = agent.submit().await.unwrap();

    let polled = agent.poll(id, |_| {}).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let events = agent.subscribe(id).await.unwrap().unwrap().collect().await;
    let last = events.last().unwrap();
    assert!(last.is_final);
    assert_eq!(last.state, polled.state);
    assert_eq!(last.result, polled.result);
    assert_eq!(events.iter().filter(|e| e.is_final).count(), 1);
    agent.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_ends_stream_with_canceled_and_worker_does_not_overwrite() {
    let agent = agent();
    let id = agent.submit().await.unwrap();
    let subscription = agent.subscribe(id).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(agent.handle(&format!("Cancel {id}")).await, Reply::Canceled(id));

    let events = subscription.collect().await;
    assert_eq!(events.last().map(|e| e.state), Some(TaskState::Canceled));

    // well past the work duration
    tokio::time::sleep(Duration::from_secs(3)).await;
    let task = agent.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Canceled);
    assert!(task.result.is_none());
    agent.shutdown().await;
}

#[tokio::test]
async fn subscribe_unknown_id_is_none() {
    let agent = agent();
    assert!(agent.subscribe(TaskId::random()).await.unwrap().is_none());
    agent.shutdown().await;
}
