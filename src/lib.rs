//! Duty dispatcher library.

pub mod config;
pub mod duty;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod processing;
pub mod routing;
pub mod worker;

pub use config::DispatcherConfig;
pub use duty::{Category, Duty};
pub use error::DispatchError;
pub use lifecycle::Shutdown;
pub use worker::{SessionReport, Worker};
