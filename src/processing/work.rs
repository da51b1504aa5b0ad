//! Pluggable duty work.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ExecutionConfig, ProcessingConfig};
use crate::duty::Duty;

/// Failure reported by a [`DutyWork`] implementation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct WorkError(pub String);

/// The work a lane performs for one duty.
///
/// Implementations run to completion; there is no cancellation once
/// started.
#[async_trait]
pub trait DutyWork: Send + Sync + fmt::Debug {
    async fn perform(&self, duty: &Duty) -> Result<(), WorkError>;
}

/// Sleeps for a uniformly random duration within `[min, max]`.
#[derive(Debug, Clone)]
pub struct SimulatedWork {
    min: Duration,
    max: Duration,
}

impl SimulatedWork {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn for_processing(config: &ProcessingConfig) -> Self {
        Self::new(config.min_delay(), config.max_delay())
    }

    pub fn for_execution(config: &ExecutionConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Pick a delay. Millisecond granularity.
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[async_trait]
impl DutyWork for SimulatedWork {
    async fn perform(&self, _duty: &Duty) -> Result<(), WorkError> {
        let delay = self.sample();
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
