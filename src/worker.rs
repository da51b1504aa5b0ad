//! Session worker.
//!
//! # Responsibilities
//! - Build the lanes for one session
//! - Split the connection between listener and coordinator
//! - Run the router in the foreground until done or interrupt
//! - Run the close sequence and report the session
//!
//! # Data Flow
//! ```text
//! DutyStream ──split──▶ read half ──▶ Listener (spawned) ──▶ ingestion channel
//!                │                          │                      │
//!                │                        done                     ▼
//!                │                          └────────────────▶ Router ──▶ spawned processors
//!                │                                                 ▲
//!                └──▶ write half ──▶ Coordinator ◀── interrupt ─────┘
//! ```

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::WebSocketStream;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::lifecycle::{Coordinator, ShutdownReason};
use crate::net::{ConnectionHandle, Listener, ListenerExit};
use crate::processing::CompletionRecord;
use crate::routing::{LaneRegistry, Router, RouterStats};

/// Outcome of a session that ended without a fatal error.
#[derive(Debug)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub reason: ShutdownReason,
    pub stats: RouterStats,
    /// Processors still running when shutdown began.
    pub in_flight_at_shutdown: usize,
    /// Normal-closure frame written.
    pub close_sent: bool,
    /// Connection released by this session's close sequence.
    pub released: bool,
}

/// Runs the dispatch core over one established connection.
pub struct Worker {
    config: DispatcherConfig,
    completions: Option<mpsc::UnboundedSender<CompletionRecord>>,
}

impl Worker {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            completions: None,
        }
    }

    /// Receive a [`CompletionRecord`] for every processed duty.
    ///
    /// The channel closes once every processor of the session has finished.
    pub fn completions(&mut self) -> mpsc::UnboundedReceiver<CompletionRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.completions = Some(tx);
        rx
    }

    /// Dispatch duties from `stream` until the session ends or `interrupt`
    /// fires.
    ///
    /// Returns `Err(DispatchError::MalformedMessage)` when the listener
    /// halted on an undecodable frame under the fatal policy; the
    /// connection has been released by then.
    pub async fn run<S>(
        self,
        stream: WebSocketStream<S>,
        interrupt: broadcast::Receiver<()>,
    ) -> Result<SessionReport, DispatchError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("session", %session_id);
        self.run_session(session_id, stream, interrupt)
            .instrument(span)
            .await
    }

    async fn run_session<S>(
        mut self,
        session_id: Uuid,
        stream: WebSocketStream<S>,
        mut interrupt: broadcast::Receiver<()>,
    ) -> Result<SessionReport, DispatchError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (registry, _executors) = LaneRegistry::standard(&self.config, self.completions.take());

        let (sink, reader) = stream.split();
        let coordinator = Coordinator::new(
            ConnectionHandle::new(sink),
            self.config.shutdown.drain_timeout(),
        );

        let (duty_tx, mut duty_rx) = mpsc::channel(self.config.ingestion.channel_capacity);
        let (done_tx, mut done_rx) = oneshot::channel();

        let listener = Listener::new(reader, duty_tx, self.config.policy.malformed);
        let listener_task = tokio::spawn(listener.run_until_done(done_tx).in_current_span());

        tracing::info!(
            channel_capacity = self.config.ingestion.channel_capacity,
            malformed_policy = ?self.config.policy.malformed,
            "Dispatch started"
        );

        let mut router = Router::new(Arc::new(registry), coordinator.in_flight());
        let reason = router.run(&mut duty_rx, &mut done_rx, &mut interrupt).await;

        // Stop reading before closing; a no-op if the listener already ended.
        listener_task.abort();

        let summary = coordinator.shutdown(&reason).await;
        router.finish();

        let stats = router.stats();
        tracing::info!(
            admitted = stats.admitted,
            dispatched = stats.dispatched,
            dropped_unknown = stats.dropped_unknown,
            in_flight = summary.in_flight,
            "Dispatch stopped"
        );

        match reason {
            ShutdownReason::SessionEnded(ListenerExit::Malformed(e)) => {
                Err(DispatchError::MalformedMessage(e))
            }
            reason => Ok(SessionReport {
                session_id,
                reason,
                stats,
                in_flight_at_shutdown: summary.in_flight,
                close_sent: summary.close_sent,
                released: summary.released,
            }),
        }
    }
}
