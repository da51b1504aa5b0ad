//! Failure injection tests for the dispatcher.

use duty_dispatcher::config::MalformedPolicy;
use duty_dispatcher::lifecycle::ShutdownReason;
use duty_dispatcher::net::{connect, ListenerExit};
use duty_dispatcher::{DispatchError, Shutdown, Worker};

mod common;
use common::{duty_frame, raw_frame, ClientEnd, Ending};

fn poisoned_stream() -> Vec<tokio_tungstenite::tungstenite::Message> {
    vec![
        duty_frame("before", "PROPOSER", 1),
        raw_frame(r#"{"validator":"x","duty":"PROPOSER","height":"#),
        duty_frame("after-1", "PROPOSER", 2),
        duty_frame("after-2", "ATTESTER", 3),
        duty_frame("after-3", "AGGREGATOR", 4),
    ]
}

#[tokio::test]
async fn test_malformed_frame_is_fatal() {
    let source = common::start_duty_source(poisoned_stream(), Ending::Hold).await;
    let stream = connect(&source.url).await.unwrap();

    let mut worker = Worker::new(common::test_config());
    let completions = worker.completions();
    let shutdown = Shutdown::new();

    let err = worker
        .run(stream, shutdown.subscribe())
        .await
        .expect_err("malformed frame must end the session with an error");
    assert!(matches!(err, DispatchError::MalformedMessage(_)));

    let records = common::collect_completions(completions).await;
    let validators: Vec<_> = records.iter().map(|r| r.duty.validator.as_str()).collect();
    assert_eq!(validators, vec!["before"]);

    // Only an interrupt writes a close frame; a fatal frame just drops the socket.
    let end = source.client_end.await.unwrap();
    assert!(matches!(end, ClientEnd::Dropped), "client ended with {end:?}");
}

#[tokio::test]
async fn test_skip_policy_keeps_reading() {
    let source = common::start_duty_source(poisoned_stream(), Ending::Close).await;
    let stream = connect(&source.url).await.unwrap();

    let mut config = common::test_config();
    config.policy.malformed = MalformedPolicy::Skip;
    let mut worker = Worker::new(config);
    let completions = worker.completions();
    let shutdown = Shutdown::new();

    let report = worker.run(stream, shutdown.subscribe()).await.unwrap();
    assert_eq!(report.stats.admitted, 4);

    let records = common::collect_completions(completions).await;
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_abrupt_disconnect_ends_session() {
    let source = common::start_duty_source(
        vec![duty_frame("v1", "SYNC_COMMITTEE", 8)],
        Ending::Abort,
    )
    .await;
    let stream = connect(&source.url).await.unwrap();

    let mut worker = Worker::new(common::test_config());
    let completions = worker.completions();
    let shutdown = Shutdown::new();

    let report = worker.run(stream, shutdown.subscribe()).await.unwrap();

    assert!(matches!(
        report.reason,
        ShutdownReason::SessionEnded(ListenerExit::ReadFailed(_) | ListenerExit::PeerClosed)
    ));
    assert!(!report.close_sent);
    assert!(report.released);

    // Work admitted before the disconnect still runs to completion.
    let records = common::collect_completions(completions).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duty.height, 8);
}

#[tokio::test]
async fn test_handshake_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = connect(&format!("ws://{addr}/ws")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Handshake { .. }));
}
