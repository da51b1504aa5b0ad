//! Shared utilities for integration tests.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use duty_dispatcher::processing::CompletionRecord;
use duty_dispatcher::DispatcherConfig;

/// What the mock source does after sending its frames.
#[allow(dead_code)]
pub enum Ending {
    /// Send a normal close frame.
    Close,
    /// Drop the TCP connection without a closing handshake.
    Abort,
    /// Keep the connection open until the client closes it.
    Hold,
}

/// How the client side of the connection ended, as seen by the source.
#[allow(dead_code)]
#[derive(Debug)]
pub enum ClientEnd {
    /// The client wrote a close frame.
    Closed(Option<CloseFrame>),
    /// The socket went away without a close frame.
    Dropped,
    /// The client neither closed nor dropped within the wait.
    Lingering,
}

/// A running mock duty source.
pub struct DutySource {
    pub url: String,
    /// Resolves once the server side of the connection is done.
    #[allow(dead_code)]
    pub client_end: oneshot::Receiver<ClientEnd>,
}

/// Start a one-shot WebSocket duty source on an ephemeral port.
pub async fn start_duty_source(frames: Vec<Message>, ending: Ending) -> DutySource {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (end_tx, client_end) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();

        for frame in frames {
            if ws.send(frame).await.is_err() {
                let _ = end_tx.send(ClientEnd::Dropped);
                return;
            }
        }

        match ending {
            Ending::Abort => {
                drop(ws);
                let _ = end_tx.send(ClientEnd::Dropped);
                return;
            }
            Ending::Close => {
                let _ = ws.close(None).await;
            }
            Ending::Hold => {}
        }

        let read_all = async {
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Close(frame) = message {
                    return ClientEnd::Closed(frame);
                }
            }
            ClientEnd::Dropped
        };
        let end = tokio::time::timeout(Duration::from_secs(10), read_all)
            .await
            .unwrap_or(ClientEnd::Lingering);
        let _ = end_tx.send(end);
    });

    DutySource {
        url: format!("ws://{}/ws", addr),
        client_end,
    }
}

/// A text frame carrying one duty.
pub fn duty_frame(validator: &str, duty: &str, height: u64) -> Message {
    Message::Text(
        format!(r#"{{"validator":"{validator}","duty":"{duty}","height":{height}}}"#).into(),
    )
}

/// A text frame with arbitrary content.
#[allow(dead_code)]
pub fn raw_frame(text: &str) -> Message {
    Message::Text(text.to_string().into())
}

/// Fast processing (1-20 ms), no executor stage.
pub fn test_config() -> DispatcherConfig {
    let mut config = DispatcherConfig::default();
    config.processing.min_delay_ms = 1;
    config.processing.max_delay_ms = 20;
    config.execution.enabled = false;
    config
}

/// Drain completion records until every processor of the session is gone.
pub async fn collect_completions(
    mut rx: mpsc::UnboundedReceiver<CompletionRecord>,
) -> Vec<CompletionRecord> {
    let mut records = Vec::new();
    loop {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(record)) => records.push(record),
            Ok(None) => return records,
            Err(_) => panic!("completion channel still open after 5s"),
        }
    }
}
