//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Ingestion channel (Duty)
//!     → router.rs (select: duty / done / interrupt)
//!     → registry.rs (category → CategoryProcessor)
//!     → tokio::spawn(processor.process(duty))
//!
//! Lane construction (at session start):
//!     DispatcherConfig
//!     → registry.rs (four standard lanes, optional executors)
//!     → Arc<LaneRegistry>, immutable while routing
//! ```
//!
//! # Design Decisions
//! - Lanes built per session, immutable at runtime
//! - Deterministic: same category always reaches the same lane
//! - No lane = silent drop

pub mod registry;
pub mod router;

pub use registry::LaneRegistry;
pub use router::{Router, RouterState, RouterStats};
