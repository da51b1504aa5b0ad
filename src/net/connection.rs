//! Upstream connection management.
//!
//! # Responsibilities
//! - Dial the duty source and complete the WebSocket handshake
//! - Own the write half of the connection
//! - Send the normal-closure frame on graceful shutdown
//! - Release the connection exactly once
//!
//! # Design Decisions
//! - Releasing drops the write half without a closing handshake; the only
//!   frame this side ever writes is the normal-closure frame on interrupt

use futures_util::{Sink, SinkExt};
use std::error::Error as StdError;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::DispatchError;
use crate::observability::metrics;

/// WebSocket stream produced by [`connect`].
pub type DutyStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dial the duty source.
pub async fn connect(url: &str) -> Result<DutyStream, DispatchError> {
    tracing::info!(url = %url, "Connecting to duty source");

    match connect_async(url).await {
        Ok((stream, response)) => {
            tracing::info!(url = %url, status = %response.status(), "Connection established");
            Ok(stream)
        }
        Err(e) => {
            if let tungstenite::Error::Http(response) = &e {
                tracing::error!(url = %url, status = %response.status(), "Handshake rejected");
            }
            Err(DispatchError::Handshake {
                url: url.to_string(),
                source: e,
            })
        }
    }
}

/// Failure to write the normal-closure frame.
#[derive(Debug, Error)]
pub enum CloseError<E> {
    #[error("connection already released")]
    AlreadyReleased,
    #[error("failed to write close frame: {0}")]
    Write(#[source] E),
}

/// Write side of the session.
///
/// The sink lives in an `Option` behind a lock; releasing takes it out, so
/// the connection is released at most once no matter how many shutdown
/// paths call [`ConnectionHandle::release`].
pub struct ConnectionHandle<S> {
    sink: Mutex<Option<S>>,
    releases: AtomicUsize,
}

impl<S> ConnectionHandle<S>
where
    S: Sink<Message> + Unpin,
    S::Error: StdError + 'static,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink: Mutex::new(Some(sink)),
            releases: AtomicUsize::new(0),
        }
    }

    /// Write a normal-closure control frame.
    ///
    /// Fails if the frame could not be written or the connection was
    /// already released.
    pub async fn send_close(&self) -> Result<(), CloseError<S::Error>> {
        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            return Err(CloseError::AlreadyReleased);
        };

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: String::new().into(),
        };
        sink.send(Message::Close(Some(frame)))
            .await
            .map_err(CloseError::Write)
    }

    /// Drop the write half. Returns false if it was already released.
    ///
    /// No frame is written here; the socket closes once the read half is
    /// gone too.
    pub async fn release(&self) -> bool {
        let Some(sink) = self.sink.lock().await.take() else {
            tracing::debug!("Connection already released");
            return false;
        };
        drop(sink);

        self.releases.fetch_add(1, Ordering::AcqRel);
        metrics::record_connection_released();
        tracing::info!("Connection released");
        true
    }

    /// How many times the connection was actually released (0 or 1).
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Acquire)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::*;

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let handle = ConnectionHandle::new(RecordingSink::default());

        assert!(handle.release().await);
        assert!(!handle.release().await);
        assert!(!handle.release().await);

        assert_eq!(handle.releases(), 1);
    }

    #[tokio::test]
    async fn test_release_writes_nothing() {
        let sink = RecordingSink::default();
        let sent = sink.sent.clone();
        let closed = sink.closed.clone();
        let handle = ConnectionHandle::new(sink);

        assert!(handle.release().await);

        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(*closed.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_frame_is_normal_closure() {
        let sink = RecordingSink::default();
        let sent = sink.sent.clone();
        let handle = ConnectionHandle::new(sink);

        handle.send_close().await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Message::Close(Some(frame)) => {
                assert_eq!(frame.code, CloseCode::Normal);
                assert!(frame.reason.is_empty());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_close_after_release_fails() {
        let handle = ConnectionHandle::new(RecordingSink::default());
        handle.release().await;
        assert!(matches!(
            handle.send_close().await,
            Err(CloseError::AlreadyReleased)
        ));
    }

    #[tokio::test]
    async fn test_close_write_failure_keeps_cause() {
        let handle = ConnectionHandle::new(RecordingSink {
            fail_writes: true,
            ..RecordingSink::default()
        });

        match handle.send_close().await {
            Err(CloseError::Write(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_handshake_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = connect(&format!("ws://{addr}/ws")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handshake { .. }));
    }
}
