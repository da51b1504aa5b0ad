//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream URL and its scheme
//! - Validate value ranges (capacities > 0, min <= max delays)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatcherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::DispatcherConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("connection.url is not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("connection.url must use ws or wss, got {0}")]
    UnsupportedScheme(String),

    #[error("{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },

    #[error("{section}.min_delay_ms ({min}) exceeds max_delay_ms ({max})")]
    DelayRange {
        section: &'static str,
        min: u64,
        max: u64,
    },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.connection.url) {
        Ok(url) if url.scheme() != "ws" && url.scheme() != "wss" => {
            errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }

    if config.ingestion.channel_capacity == 0 {
        errors.push(ValidationError::ZeroCapacity {
            field: "ingestion.channel_capacity",
        });
    }

    if config.processing.min_delay_ms > config.processing.max_delay_ms {
        errors.push(ValidationError::DelayRange {
            section: "processing",
            min: config.processing.min_delay_ms,
            max: config.processing.max_delay_ms,
        });
    }

    if config.execution.enabled {
        if config.execution.queue_capacity == 0 {
            errors.push(ValidationError::ZeroCapacity {
                field: "execution.queue_capacity",
            });
        }
        if config.execution.min_delay_ms > config.execution.max_delay_ms {
            errors.push(ValidationError::DelayRange {
                section: "execution",
                min: config.execution.min_delay_ms,
                max: config.execution.max_delay_ms,
            });
        }
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
