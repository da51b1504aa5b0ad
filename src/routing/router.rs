//! Duty routing and dispatch.
//!
//! # Responsibilities
//! - Wait on the ingestion channel, session-done and interrupt
//! - Look up the lane for each duty and spawn its processor
//! - Stop on done or interrupt
//!
//! # Design Decisions
//! - Fire-and-forget: the router never awaits a processor
//! - Unknown categories are dropped silently (counted, logged at debug)
//! - Interrupt is checked first, then pending duties, then done, so every
//!   duty the listener handed over before ending the session is dispatched
//! - Duties still queued when an interrupt wins are lost
//! - A dropped interrupt trigger is not an interrupt; the router keeps
//!   running until the session ends

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::duty::Duty;
use crate::lifecycle::{InFlight, ShutdownReason};
use crate::net::ListenerExit;
use crate::observability::metrics;
use crate::routing::registry::LaneRegistry;

/// Router state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Running,
    Closing,
    Stopped,
}

/// Counters kept by the router for the session report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Duties taken off the ingestion channel.
    pub admitted: u64,
    /// Duties handed to a lane.
    pub dispatched: u64,
    /// Duties with no lane.
    pub dropped_unknown: u64,
}

pub struct Router {
    registry: Arc<LaneRegistry>,
    in_flight: InFlight,
    state: RouterState,
    stats: RouterStats,
}

impl Router {
    pub fn new(registry: Arc<LaneRegistry>, in_flight: InFlight) -> Self {
        Self {
            registry,
            in_flight,
            state: RouterState::Running,
            stats: RouterStats::default(),
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Select loop. Returns once done or interrupt fires; the router is
    /// then `Closing` until [`Router::finish`].
    pub async fn run(
        &mut self,
        duties: &mut mpsc::Receiver<Duty>,
        done: &mut oneshot::Receiver<ListenerExit>,
        interrupt: &mut broadcast::Receiver<()>,
    ) -> ShutdownReason {
        let mut interrupt_open = true;
        let reason = loop {
            tokio::select! {
                biased;

                signal = interrupt.recv(), if interrupt_open => match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        tracing::info!("Interrupt received, stopping dispatch");
                        break ShutdownReason::Interrupted;
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Interrupt trigger dropped");
                        interrupt_open = false;
                    }
                },
                Some(duty) = duties.recv() => {
                    self.dispatch(duty);
                }
                exit = &mut *done => {
                    let exit = exit.unwrap_or(ListenerExit::Aborted);
                    tracing::info!(reason = ?exit, "Session done, stopping dispatch");
                    break ShutdownReason::SessionEnded(exit);
                }
            }
        };

        self.state = RouterState::Closing;
        reason
    }

    /// Spawn the lane's processor for `duty`. Returns false if the duty
    /// has no lane.
    pub fn dispatch(&mut self, duty: Duty) -> bool {
        self.stats.admitted += 1;

        let Some(processor) = self.registry.get(&duty.category) else {
            tracing::debug!(duty = %duty, "No lane for category, dropping duty");
            self.stats.dropped_unknown += 1;
            metrics::record_dropped("unknown_category");
            return false;
        };

        tracing::debug!(duty = %duty, "Dispatching duty");
        metrics::record_dispatched(&duty.category);
        self.stats.dispatched += 1;

        let guard = self.in_flight.enter();
        tokio::spawn(async move {
            let _guard = guard;
            processor.process(duty).await;
        });
        true
    }

    /// Mark the close sequence as complete.
    pub fn finish(&mut self) {
        self.state = RouterState::Stopped;
    }
}
