//! Duty processing lanes.
//!
//! # Data Flow
//! ```text
//! Router spawns one task per duty
//!     → processor.rs (CategoryProcessor::process: work → completion record)
//!     → executor.rs (serial per-lane execution of processed duties)
//!
//! work.rs: DutyWork trait + SimulatedWork (random delay)
//! ```
//!
//! # Design Decisions
//! - Lanes are data (category + work), not separate types
//! - Processing never cancels mid-work
//! - Completion order across lanes is not defined

pub mod executor;
pub mod processor;
pub mod work;

pub use executor::Executor;
pub use processor::{CategoryProcessor, CompletionRecord, ProcessOutcome};
pub use work::{DutyWork, SimulatedWork, WorkError};
