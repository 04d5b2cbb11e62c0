use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An application-defined event with a type discriminator.
///
/// The engine never inspects the payload; it only routes on `event_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub payload: Vec<u8>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: payload.into(),
        }
    }
}

/// A container for one event on a stream.
///
/// Envelopes are immutable once appended. The offset is the zero-based
/// position of the event on its stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub offset: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: Event,
}
