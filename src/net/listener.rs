//! Inbound duty listener.
//!
//! # Responsibilities
//! - Read frames from the connection until it ends
//! - Decode payloads into duties
//! - Hand each duty to the router over the ingestion channel
//! - Report why it stopped, exactly once
//!
//! # Design Decisions
//! - Single producer for the ingestion channel
//! - The send awaits router capacity; nothing is buffered here
//! - Malformed payloads follow [`MalformedPolicy`]

use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::config::MalformedPolicy;
use crate::duty::{classify, decode, DecodeError, Duty, FrameKind};
use crate::observability::metrics;

/// Why the listener stopped reading.
#[derive(Debug)]
pub enum ListenerExit {
    /// The peer sent a close frame or the stream ended.
    PeerClosed,
    /// Transport error while reading.
    ReadFailed(String),
    /// A payload failed to decode under the fatal policy.
    Malformed(DecodeError),
    /// The router dropped the ingestion channel.
    RouterGone,
    /// The listener task ended without reporting.
    Aborted,
}

impl ListenerExit {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ListenerExit::Malformed(_))
    }
}

/// Receive loop over the read half of the connection.
pub struct Listener<R> {
    reader: R,
    duties: mpsc::Sender<Duty>,
    policy: MalformedPolicy,
}

impl<R> Listener<R>
where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    pub fn new(reader: R, duties: mpsc::Sender<Duty>, policy: MalformedPolicy) -> Self {
        Self {
            reader,
            duties,
            policy,
        }
    }

    /// Run until the connection ends, then report on `done`.
    ///
    /// The ingestion sender is dropped before `done` fires.
    pub async fn run_until_done(self, done: oneshot::Sender<ListenerExit>) {
        let exit = self.run().await;
        tracing::info!(reason = ?exit, "Listener stopped");
        let _ = done.send(exit);
    }

    /// Read, decode and forward until the connection ends.
    pub async fn run(mut self) -> ListenerExit {
        loop {
            let message = match self.reader.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Read failed");
                    return ListenerExit::ReadFailed(e.to_string());
                }
                None => return ListenerExit::PeerClosed,
            };

            let payload = match classify(message) {
                FrameKind::Payload(payload) => payload,
                FrameKind::Control => continue,
                FrameKind::Close(frame) => {
                    tracing::info!(frame = ?frame, "Peer closed connection");
                    return ListenerExit::PeerClosed;
                }
            };

            metrics::record_frame_received();
            tracing::debug!(message = %String::from_utf8_lossy(&payload), "Message received");

            let duty = match decode(&payload) {
                Ok(duty) => duty,
                Err(e) => match self.policy {
                    MalformedPolicy::Fatal => {
                        tracing::error!(error = %e, "Cannot decode message, halting ingestion");
                        return ListenerExit::Malformed(e);
                    }
                    MalformedPolicy::Skip => {
                        tracing::warn!(error = %e, "Skipping malformed message");
                        metrics::record_dropped("malformed");
                        continue;
                    }
                },
            };

            tracing::info!(duty = %duty, "Duty received");

            if self.duties.send(duty).await.is_err() {
                return ListenerExit::RouterGone;
            }
        }
    }
}
