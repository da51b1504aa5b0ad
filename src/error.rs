//! Session-level errors.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::config::ConfigError;
use crate::duty::DecodeError;

/// Errors that end a dispatcher session.
///
/// Transport read failures are not here: they end the session through the
/// normal shutdown path and are reported in the session report.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The WebSocket handshake with the duty source failed.
    #[error("handshake with {url} failed: {source}")]
    Handshake {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    /// A frame could not be decoded under the fatal policy.
    #[error("malformed message: {0}")]
    MalformedMessage(#[source] DecodeError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
