//! Frame decoding.
//!
//! # Responsibilities
//! - Classify WebSocket frames into payloads, control frames and close
//! - Decode a payload into a [`Duty`]
//!
//! # Design Decisions
//! - Payload must be a JSON object or `null`; arrays and other scalars are
//!   malformed. A bare `null` decodes to the zero duty
//! - Unknown fields are ignored; missing or `null` fields take their zero value
//! - Field names match case-insensitively (`Validator`, `HEIGHT`); an exact
//!   match wins over a case-folded one
//! - Category is not checked here; routing decides

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::duty::types::Duty;

/// Error returned when a payload is not a duty.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed duty message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// What a received WebSocket frame carries.
#[derive(Debug)]
pub enum FrameKind {
    /// Application data to decode.
    Payload(Vec<u8>),
    /// Ping, pong or raw frames; no application meaning.
    Control,
    /// The peer started the closing handshake.
    Close(Option<CloseFrame>),
}

/// Sort a frame by what the listener should do with it.
pub fn classify(message: Message) -> FrameKind {
    match message {
        Message::Text(text) => FrameKind::Payload(text.as_str().as_bytes().to_vec()),
        Message::Binary(bytes) => FrameKind::Payload(bytes.to_vec()),
        Message::Close(frame) => FrameKind::Close(frame),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => FrameKind::Control,
    }
}

const FIELDS: [&str; 3] = ["validator", "duty", "height"];

/// Decode one payload into a duty.
pub fn decode(payload: &[u8]) -> Result<Duty, DecodeError> {
    let Some(object) = serde_json::from_slice::<Option<Map<String, Value>>>(payload)? else {
        return Ok(Duty::default());
    };
    let duty = Duty::deserialize(Value::Object(fold_field_names(object)))?;
    Ok(duty)
}

/// Rename keys that match a duty field case-insensitively to the field's
/// wire name; other keys are dropped.
fn fold_field_names(object: Map<String, Value>) -> Map<String, Value> {
    let mut folded = Map::new();
    for (key, value) in object {
        match FIELDS.iter().find(|field| field.eq_ignore_ascii_case(&key)) {
            Some(field) if *field == key => {
                folded.insert(key, value);
            }
            Some(field) => {
                folded.entry(*field).or_insert(value);
            }
            None => {}
        }
    }
    folded
}
