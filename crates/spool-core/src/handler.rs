//! The projection handler capability set.

use std::time::Duration;

use async_trait::async_trait;

use crate::envelope::Event;
use crate::error::Result;
use crate::scope::{CompactScope, EventScope};

/// A projection handler applies events to some stateful read model.
///
/// Handlers are external collaborators: the engine treats their storage and
/// business logic as opaque and talks to them only through this trait. The
/// engine makes one call into the handler at a time: an `apply_event` and a
/// `compact` invocation are never outstanding together.
#[async_trait]
pub trait ProjectionHandler: Send + Sync {
    /// Human-readable identity of the projection, used in log lines and
    /// error messages.
    fn name(&self) -> &str;

    /// The event types this projection consumes. An empty list consumes
    /// every type on the stream.
    fn consumed_event_types(&self) -> Vec<String>;

    /// An optional per-event deadline hint.
    ///
    /// `None` or a zero duration means "no preference" and falls through to
    /// the projector's configured default.
    fn timeout_hint(&self, event: &Event) -> Option<Duration> {
        let _ = event;
        None
    }

    /// Return the OCC version currently persisted for `resource`.
    ///
    /// An empty version means no events have been applied yet.
    async fn resource_version(&self, resource: &[u8]) -> Result<Vec<u8>>;

    /// Apply one event, atomically replacing the persisted version of
    /// `resource` from `current` to `next`.
    ///
    /// Returns `Ok(false)` if the persisted version no longer matches
    /// `current`. This is the sanctioned OCC conflict signal, after which
    /// the projector restarts from the updated version. `Ok(false)` is
    /// never treated as a failure.
    async fn apply_event(
        &self,
        resource: &[u8],
        current: &[u8],
        next: &[u8],
        scope: &EventScope,
        event: &Event,
    ) -> Result<bool>;

    /// Perform maintenance on the projection's storage.
    ///
    /// Invoked periodically and independently of consumption. The default
    /// implementation does nothing.
    async fn compact(&self, scope: &CompactScope) -> Result<()> {
        let _ = scope;
        Ok(())
    }
}
