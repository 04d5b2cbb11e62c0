//! Scopes passed to projection handlers during apply and compaction.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Context for a single `apply_event` invocation.
///
/// Exposes the recorded timestamp of the event being applied, the effective
/// deadline the projector granted the call, and a logging sink tagged with
/// the handler identity, resource and offset.
#[derive(Debug, Clone)]
pub struct EventScope {
    handler: String,
    resource: Vec<u8>,
    offset: u64,
    recorded_at: DateTime<Utc>,
    timeout: Duration,
}

impl EventScope {
    pub fn new(
        handler: impl Into<String>,
        resource: impl Into<Vec<u8>>,
        offset: u64,
        recorded_at: DateTime<Utc>,
        timeout: Duration,
    ) -> Self {
        Self {
            handler: handler.into(),
            resource: resource.into(),
            offset,
            recorded_at,
            timeout,
        }
    }

    /// The time at which the event was recorded on the stream.
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// The offset of the event being applied.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The effective deadline for this invocation, after resolving the
    /// handler hint against the projector's defaults.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record an informational message within the context of the event
    /// being handled.
    pub fn log(&self, message: impl AsRef<str>) {
        tracing::info!(
            handler = %self.handler,
            resource = %String::from_utf8_lossy(&self.resource),
            offset = self.offset,
            "{}",
            message.as_ref(),
        );
    }
}

/// Context for a single `compact` invocation.
#[derive(Debug, Clone)]
pub struct CompactScope {
    handler: String,
}

impl CompactScope {
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
        }
    }

    /// The current wall-clock time.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Record an informational message within the context of the
    /// compaction pass.
    pub fn log(&self, message: impl AsRef<str>) {
        tracing::info!(handler = %self.handler, "{}", message.as_ref());
    }
}
