//! Duty dispatcher (v1)
//!
//! Receives duties over a WebSocket connection and processes each one in
//! the lane for its category.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────────┐
//!                          │                   DUTY DISPATCHER                     │
//!                          │                                                       │
//!     Duty source          │  ┌──────────┐    ┌──────────┐    ┌───────────────┐   │
//!     ─────────────────────┼─▶│   net    │───▶│ ingestion│───▶│   routing     │   │
//!      (WebSocket frames)  │  │ listener │    │ channel  │    │   router      │   │
//!                          │  └──────────┘    └──────────┘    └──────┬────────┘   │
//!                          │                                         │ spawn      │
//!                          │                                         ▼            │
//!                          │           ┌──────────┬──────────┬──────────┬───────┐ │
//!                          │           │ PROPOSER │ ATTESTER │AGGREGATOR│ SYNC_ │ │
//!                          │           │   lane   │   lane   │   lane   │COMMIT.│ │
//!                          │           └──────────┴──────────┴──────────┴───────┘ │
//!                          │                                                       │
//!     Close frame          │  ┌────────────────────────────────────────────────┐  │
//!     ◀────────────────────┼──│ lifecycle: interrupt, in-flight, release once  │  │
//!                          │  └────────────────────────────────────────────────┘  │
//!                          └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use duty_dispatcher::config::validation::validate_config;
use duty_dispatcher::config::{load_config, ConfigError, DispatcherConfig, MalformedPolicy};
use duty_dispatcher::lifecycle::{signals, Shutdown};
use duty_dispatcher::net::connect;
use duty_dispatcher::observability::{logging, metrics};
use duty_dispatcher::Worker;

#[derive(Parser)]
#[command(name = "duty-dispatcher")]
#[command(about = "Receive duties over WebSocket and process them by category", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Duty source URL (overrides the config file).
    #[arg(short, long)]
    url: Option<String>,

    /// Log and skip undecodable frames instead of halting.
    #[arg(long)]
    skip_malformed: bool,
}

fn resolve_config(cli: &Cli) -> Result<DispatcherConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatcherConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.connection.url = url.clone();
    }
    if cli.skip_malformed {
        config.policy.malformed = MalformedPolicy::Skip;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_tracing(&config.observability);

    tracing::info!("duty-dispatcher v0.1.0 starting");
    tracing::info!(
        url = %config.connection.url,
        min_delay_ms = config.processing.min_delay_ms,
        max_delay_ms = config.processing.max_delay_ms,
        execution = config.execution.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let stream = connect(&config.connection.url).await?;

    let shutdown = Shutdown::new();
    let interrupt = shutdown.subscribe();
    signals::spawn_interrupt_handler(shutdown);

    let report = Worker::new(config).run(stream, interrupt).await?;

    tracing::info!(
        session_id = %report.session_id,
        reason = %report.reason,
        admitted = report.stats.admitted,
        in_flight = report.in_flight_at_shutdown,
        "Shutdown complete"
    );
    Ok(())
}
