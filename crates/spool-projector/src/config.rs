//! Projector configuration.

use std::time::Duration;

/// Default deadline for applying a single event when neither the handler's
/// hint nor the projector's configuration provides one.
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Default interval between compaction passes.
pub const DEFAULT_COMPACT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default deadline for a single compaction pass.
pub const DEFAULT_COMPACT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Configuration for a [`Projector`](crate::Projector).
///
/// Every field treats a zero duration as "unset": the value falls through
/// to the matching global default constant at call time. A handler timeout
/// hint of zero falls through the same way.
#[derive(Debug, Clone, Default)]
pub struct ProjectorConfig {
    /// Deadline for applying one event when the handler gives no hint.
    pub apply_timeout: Duration,
    /// Interval between compaction passes.
    pub compact_interval: Duration,
    /// Deadline for a single compaction pass.
    pub compact_timeout: Duration,
}

impl ProjectorConfig {
    /// Create a configuration with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-event apply deadline.
    pub fn with_apply_timeout(mut self, timeout: Duration) -> Self {
        self.apply_timeout = timeout;
        self
    }

    /// Set the interval between compaction passes.
    pub fn with_compact_interval(mut self, interval: Duration) -> Self {
        self.compact_interval = interval;
        self
    }

    /// Set the deadline for a single compaction pass.
    pub fn with_compact_timeout(mut self, timeout: Duration) -> Self {
        self.compact_timeout = timeout;
        self
    }
}

/// Resolve a possibly-unset duration against its global default.
pub(crate) fn or_default(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
