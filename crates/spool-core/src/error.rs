use std::time::Duration;
use thiserror::Error;

/// Errors produced by streams, cursors and the projector.
#[derive(Error, Debug)]
pub enum SpoolError {
    /// The stream has been sealed; no further events will ever arrive.
    #[error("stream is sealed, no more events will be appended")]
    Sealed,

    /// The cursor was closed by its owner.
    #[error("cursor is closed")]
    CursorClosed,

    /// The caller's cancellation signal fired. Never wrapped by the
    /// projector; callers can match on it directly.
    #[error("consumer canceled")]
    Canceled,

    /// The requested offset has been truncated out of the retained window.
    #[error("cannot read truncated event at offset {requested}, first available offset is {first}")]
    Truncated { requested: u64, first: u64 },

    /// The persisted OCC version has an illegal length.
    #[error("persisted version is {0} byte(s) in length, expected 0 or 8")]
    MalformedVersion(usize),

    /// The handler did not complete within its effective deadline.
    #[error("handler did not finish within {0:?}")]
    Timeout(Duration),

    /// An event of a type the handler never declared was routed to it.
    #[error("unexpected event type '{event_type}' passed to {operation}")]
    UnexpectedEventType {
        event_type: String,
        operation: String,
    },

    /// Consumption failed; names the stream and the projection so the
    /// failure can be attributed without reading the source chain.
    #[error("unable to consume from stream '{stream}' for the '{handler}' projection: {source}")]
    Consume {
        stream: String,
        handler: String,
        #[source]
        source: Box<SpoolError>,
    },

    /// Compaction failed with a non-timeout error.
    #[error("compaction failed for the '{handler}' projection: {source}")]
    Compact {
        handler: String,
        #[source]
        source: Box<SpoolError>,
    },

    /// Opaque failure from a projection handler.
    #[error("handler error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SpoolError>;
