//! Category processor.
//!
//! # Responsibilities
//! - Run the lane's work for one duty to completion
//! - Emit exactly one completion record per duty
//! - Hand successfully processed duties to the lane's executor
//!
//! # Design Decisions
//! - One generic processor; lanes differ only by category and work
//! - Work failures become [`ProcessOutcome::Failed`], never panics

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::duty::{Category, Duty};
use crate::observability::metrics;
use crate::processing::work::DutyWork;

/// Result of processing one duty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed,
    Failed(String),
}

impl ProcessOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Completed => "completed",
            ProcessOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProcessOutcome::Completed)
    }
}

/// Emitted once for every processed duty.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    /// Lane that processed the duty.
    pub category: Category,
    pub duty: Duty,
    pub outcome: ProcessOutcome,
    pub elapsed: Duration,
}

/// Processor for one duty category.
#[derive(Debug, Clone)]
pub struct CategoryProcessor {
    category: Category,
    work: Arc<dyn DutyWork>,
    executor: Option<mpsc::Sender<Duty>>,
    completions: Option<mpsc::UnboundedSender<CompletionRecord>>,
}

impl CategoryProcessor {
    pub fn new(category: Category, work: Arc<dyn DutyWork>) -> Self {
        Self {
            category,
            work,
            executor: None,
            completions: None,
        }
    }

    /// Forward completed duties to an executor queue.
    pub fn with_executor(mut self, executor: mpsc::Sender<Duty>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Publish completion records on `completions`.
    pub fn with_completions(mut self, completions: mpsc::UnboundedSender<CompletionRecord>) -> Self {
        self.completions = Some(completions);
        self
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Process one duty.
    pub async fn process(&self, duty: Duty) -> ProcessOutcome {
        let start = Instant::now();
        let outcome = match self.work.perform(&duty).await {
            Ok(()) => ProcessOutcome::Completed,
            Err(e) => ProcessOutcome::Failed(e.to_string()),
        };
        let elapsed = start.elapsed();

        match &outcome {
            ProcessOutcome::Completed => tracing::info!(
                category = %self.category,
                duty = %duty,
                elapsed_ms = elapsed.as_millis() as u64,
                "Duty processed"
            ),
            ProcessOutcome::Failed(reason) => tracing::warn!(
                category = %self.category,
                duty = %duty,
                reason = %reason,
                "Duty processing failed"
            ),
        }
        metrics::record_completed(&self.category, outcome.label(), elapsed);

        if let Some(completions) = &self.completions {
            let _ = completions.send(CompletionRecord {
                category: self.category.clone(),
                duty: duty.clone(),
                outcome: outcome.clone(),
                elapsed,
            });
        }

        if outcome.is_completed() {
            if let Some(executor) = &self.executor {
                if executor.send(duty).await.is_err() {
                    tracing::debug!(category = %self.category, "Executor stopped, duty not executed");
                }
            }
        }

        outcome
    }
}
