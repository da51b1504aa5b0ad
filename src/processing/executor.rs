//! Per-lane executor stage.
//!
//! Each lane owns one executor task that receives every processed duty of
//! its category and executes them one at a time, in the order the
//! processors finished. The task ends when every sender is gone.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::duty::{Category, Duty};
use crate::processing::work::DutyWork;

pub struct Executor {
    category: Category,
    work: Arc<dyn DutyWork>,
    queue: mpsc::Receiver<Duty>,
}

impl Executor {
    /// Create an executor and the sender processors use to feed it.
    pub fn new(
        category: Category,
        work: Arc<dyn DutyWork>,
        capacity: usize,
    ) -> (Self, mpsc::Sender<Duty>) {
        let (tx, queue) = mpsc::channel(capacity);
        (
            Self {
                category,
                work,
                queue,
            },
            tx,
        )
    }

    /// Execute queued duties until the queue closes. Returns how many
    /// were executed successfully.
    pub async fn run(mut self) -> usize {
        let mut executed = 0;
        while let Some(duty) = self.queue.recv().await {
            match self.work.perform(&duty).await {
                Ok(()) => {
                    executed += 1;
                    tracing::info!(category = %self.category, duty = %duty, "Duty executed");
                }
                Err(e) => {
                    tracing::warn!(category = %self.category, duty = %duty, error = %e, "Duty execution failed");
                }
            }
        }
        tracing::debug!(category = %self.category, executed, "Executor stopped");
        executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::processor::test_support::CountingWork;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_executes_until_closed() {
        let work = CountingWork::default();
        let calls = work.calls.clone();
        let (executor, tx) = Executor::new(Category::Proposer, Arc::new(work), 8);
        let handle = tokio::spawn(executor.run());

        for h in 0..3 {
            tx.send(Duty::new("v1", Category::Proposer, h)).await.unwrap();
        }
        drop(tx);

        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_execution_not_counted() {
        let work = CountingWork {
            fail: true,
            ..CountingWork::default()
        };
        let (executor, tx) = Executor::new(Category::Attester, Arc::new(work), 1);
        let handle = tokio::spawn(executor.run());

        tx.send(Duty::new("v1", Category::Attester, 1)).await.unwrap();
        drop(tx);

        assert_eq!(handle.await.unwrap(), 0);
    }
}
