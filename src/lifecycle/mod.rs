//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger → router interrupt branch
//!
//! Tracking (tracker.rs):
//!     router spawn → InFlight::enter → guard dropped when processor ends
//!
//! Shutdown (shutdown.rs):
//!     router stopped → [close frame if interrupted] → release connection once
//!     → [optional bounded drain of in-flight work]
//! ```
//!
//! # Design Decisions
//! - Shutdown stops new dispatch; running processors are not cancelled
//! - Connection release is idempotent across both shutdown paths
//! - Drain is opt-in and bounded

pub mod shutdown;
pub mod signals;
pub mod tracker;

pub use shutdown::{Coordinator, Shutdown, ShutdownReason, ShutdownSummary};
pub use tracker::{InFlight, InFlightGuard};
