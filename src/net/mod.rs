//! Network layer.
//!
//! # Data Flow
//! ```text
//! connection.rs: connect(url) → WebSocket handshake → DutyStream
//!     split →  read half  → listener.rs (frames → duties → ingestion channel)
//!           →  write half → ConnectionHandle (close frame, release once)
//! ```

pub mod connection;
pub mod listener;

pub use connection::{connect, CloseError, ConnectionHandle, DutyStream};
pub use listener::{Listener, ListenerExit};
