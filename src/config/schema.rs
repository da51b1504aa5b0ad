//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatcher.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the duty dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Upstream duty source.
    pub connection: ConnectionConfig,

    /// Listener → router hand-off.
    pub ingestion: IngestionConfig,

    /// Category processor work bounds.
    pub processing: ProcessingConfig,

    /// Per-lane executor stage.
    pub execution: ExecutionConfig,

    /// Error policies.
    pub policy: PolicyConfig,

    /// Shutdown behavior.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Upstream connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket URL of the duty source (e.g., "ws://127.0.0.1:5000/ws").
    pub url: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000/ws".to_string(),
        }
    }
}

/// Ingestion channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Slots in the listener → router channel. 1 keeps the listener in
    /// lock-step with the router.
    pub channel_capacity: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { channel_capacity: 1 }
    }
}

/// Simulated processing bounds, inclusive.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Lower bound of the simulated work delay in milliseconds.
    pub min_delay_ms: u64,

    /// Upper bound of the simulated work delay in milliseconds.
    pub max_delay_ms: u64,
}

impl ProcessingConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 20_000,
        }
    }
}

/// Executor stage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Run a serial executor behind every lane.
    pub enabled: bool,

    /// Processed duties buffered per lane before processors wait.
    pub queue_capacity: usize,

    /// Lower bound of the simulated execution delay in milliseconds.
    pub min_delay_ms: u64,

    /// Upper bound of the simulated execution delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: 64,
            min_delay_ms: 1_000,
            max_delay_ms: 20_000,
        }
    }
}

/// What the listener does with a frame that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Stop reading and end the process.
    #[default]
    Fatal,
    /// Log the frame and keep reading.
    Skip,
}

/// Error policies.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    pub malformed: MalformedPolicy,
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long to wait for in-flight processors before returning.
    /// 0 returns immediately without waiting.
    pub drain_timeout_ms: u64,
}

impl ShutdownConfig {
    pub fn drain_timeout(&self) -> Option<Duration> {
        (self.drain_timeout_ms > 0).then(|| Duration::from_millis(self.drain_timeout_ms))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
