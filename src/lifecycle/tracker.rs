//! In-flight processor tracking.
//!
//! Counts running category processors. A guard is taken when a processor
//! is spawned and released when it finishes, so the count can never leak
//! even if the processing task panics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::observability::metrics;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Shared in-flight counter.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<Inner>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one running processor.
    pub fn enter(&self) -> InFlightGuard {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        metrics::record_in_flight_entered();
        InFlightGuard {
            inner: self.inner.clone(),
        }
    }

    /// Number of processors currently running.
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Wait until nothing is in flight, giving up after `timeout`.
    ///
    /// Returns true if the count reached zero.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.inner.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.count() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

/// Releases its slot in [`InFlight`] on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    inner: Arc<Inner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let remaining = self.inner.count.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_in_flight_exited();
        if remaining == 0 {
            self.inner.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_guard_counts() {
        let in_flight = InFlight::new();
        let a = in_flight.enter();
        let b = in_flight.clone().enter();
        assert_eq!(in_flight.count(), 2);
        drop(a);
        assert_eq!(in_flight.count(), 1);
        drop(b);
        assert_eq!(in_flight.count(), 0);
    }

    #[test]
    fn test_gauge_follows_guards() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            let in_flight = InFlight::new();
            let a = in_flight.enter();
            let b = in_flight.clone().enter();
            let c = in_flight.enter();
            drop(b);
            drop(a);
            let rendered = handle.render();
            assert!(rendered.contains("duty_in_flight 1\n"), "{rendered}");
            drop(c);
        });

        assert!(handle.render().contains("duty_in_flight 0\n"));
    }

    #[tokio::test]
    async fn test_wait_idle_returns_when_drained() {
        let in_flight = InFlight::new();
        let guard = in_flight.enter();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });

        assert!(in_flight.wait_idle(Duration::from_secs(2)).await);
        assert_eq!(in_flight.count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_times_out() {
        let in_flight = InFlight::new();
        let _guard = in_flight.enter();
        assert!(!in_flight.wait_idle(Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn test_wait_idle_when_already_idle() {
        assert!(InFlight::new().wait_idle(Duration::from_millis(1)).await);
    }
}
