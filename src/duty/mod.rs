//! Duty model and decoding.
//!
//! # Data Flow
//! ```text
//! WebSocket frame
//!     → decoder.rs (classify: payload / control / close)
//!     → decoder.rs (JSON object → Duty)
//!     → types.rs (Duty { validator, category, height })
//! ```

pub mod decoder;
pub mod types;

pub use decoder::{classify, decode, DecodeError, FrameKind};
pub use types::{Category, Duty};
