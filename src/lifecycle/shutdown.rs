//! Shutdown coordination for the dispatcher.

use futures_util::Sink;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;

use crate::lifecycle::tracker::InFlight;
use crate::net::{ConnectionHandle, ListenerExit};

/// Interrupt trigger.
///
/// Provides a broadcast channel that the router (and anything else that
/// must stop on interrupt) subscribes to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown trigger.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    ///
    /// Subscribe before triggering; earlier signals are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the router stopped.
#[derive(Debug)]
pub enum ShutdownReason {
    /// External interrupt.
    Interrupted,
    /// The listener ended the session.
    SessionEnded(ListenerExit),
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupted => f.write_str("interrupted"),
            ShutdownReason::SessionEnded(exit) => write!(f, "session ended ({exit:?})"),
        }
    }
}

/// What the close sequence did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownSummary {
    /// The normal-closure frame was written.
    pub close_sent: bool,
    /// This call released the connection.
    pub released: bool,
    /// Processors still running when shutdown began.
    pub in_flight: usize,
    /// Whether in-flight work drained within the configured timeout.
    /// `None` when no drain was requested.
    pub drained: Option<bool>,
}

/// Owns the in-flight tracker and the connection's write half; runs the
/// close sequence once the router has stopped.
pub struct Coordinator<S> {
    connection: ConnectionHandle<S>,
    in_flight: InFlight,
    drain_timeout: Option<Duration>,
}

impl<S> Coordinator<S>
where
    S: Sink<Message> + Unpin,
    S::Error: StdError + 'static,
{
    pub fn new(connection: ConnectionHandle<S>, drain_timeout: Option<Duration>) -> Self {
        Self {
            connection,
            in_flight: InFlight::new(),
            drain_timeout,
        }
    }

    /// Tracker the router registers spawned processors with.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    pub fn connection(&self) -> &ConnectionHandle<S> {
        &self.connection
    }

    /// Run the close sequence for `reason`.
    ///
    /// On interrupt a normal-closure frame is written first; a write failure
    /// is logged and does not stop the release. The connection is released
    /// at most once across all calls.
    pub async fn shutdown(&self, reason: &ShutdownReason) -> ShutdownSummary {
        let in_flight = self.in_flight.count();
        tracing::info!(reason = %reason, in_flight, "Shutting down");

        let close_sent = match reason {
            ShutdownReason::Interrupted => match self.connection.send_close().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to write close frame");
                    false
                }
            },
            ShutdownReason::SessionEnded(_) => false,
        };

        let released = self.connection.release().await;

        let drained = match self.drain_timeout {
            Some(timeout) if in_flight > 0 => {
                let drained = self.in_flight.wait_idle(timeout).await;
                if !drained {
                    tracing::warn!(
                        remaining = self.in_flight.count(),
                        timeout_ms = timeout.as_millis() as u64,
                        "In-flight duties still running after drain timeout"
                    );
                }
                Some(drained)
            }
            Some(_) => Some(true),
            None => None,
        };

        ShutdownSummary {
            close_sent,
            released,
            in_flight,
            drained,
        }
    }
}
