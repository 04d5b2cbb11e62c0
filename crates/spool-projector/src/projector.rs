use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use spool_core::{
    version, CancelSignal, CompactScope, Event, EventScope, EventStream, ProjectionHandler,
    Result, SpoolError, StreamCursor, TypeFilter,
};

use crate::config::{
    or_default, ProjectorConfig, DEFAULT_APPLY_TIMEOUT, DEFAULT_COMPACT_INTERVAL,
    DEFAULT_COMPACT_TIMEOUT,
};

/// Projector: reads events from a stream and applies them to a projection.
///
/// Consumption and compaction run as a supervised pair of tasks: the first
/// real error cancels the sibling and determines the result, while pure
/// cancellation always surfaces as [`SpoolError::Canceled`], unwrapped.
pub struct Projector<S, H>
where
    S: EventStream,
    H: ProjectionHandler,
{
    stream: Arc<S>,
    handler: Arc<H>,
    config: ProjectorConfig,
    /// Serializes calls into the handler: an apply and a compaction
    /// pass are never outstanding at the same time.
    handler_gate: Mutex<()>,
}

impl<S, H> Projector<S, H>
where
    S: EventStream,
    H: ProjectionHandler,
{
    pub fn new(stream: Arc<S>, handler: Arc<H>) -> Self {
        Self {
            stream,
            handler,
            config: ProjectorConfig::default(),
            handler_gate: Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: ProjectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply events to the projection until `cancel` fires or an error
    /// occurs.
    ///
    /// An optimistic concurrency conflict within the projection restarts
    /// the consumer automatically. Any other error is returned and retry
    /// policy is the caller's responsibility; `run` can safely be called
    /// again after exiting with an error.
    pub async fn run(&self, cancel: CancelSignal) -> Result<()> {
        let result = tokio::try_join!(
            self.consume_loop(&cancel),
            self.compact_loop(&cancel),
        );

        match result {
            Ok(((), ())) => Ok(()),
            Err(_) if cancel.is_canceled() => Err(SpoolError::Canceled),
            Err(SpoolError::Canceled) => Err(SpoolError::Canceled),
            Err(err) => Err(err),
        }
    }

    /// Consume until a fatal error, restarting on each OCC conflict.
    async fn consume_loop(&self, cancel: &CancelSignal) -> Result<()> {
        loop {
            match self.consume(cancel).await {
                // A conflict means a concurrent writer advanced the
                // version; re-resolve and pick up from there.
                Ok(()) => {}
                Err(SpoolError::Canceled) => return Err(SpoolError::Canceled),
                Err(_) if cancel.is_canceled() => return Err(SpoolError::Canceled),
                Err(err) => {
                    return Err(SpoolError::Consume {
                        stream: self.stream.id().to_string(),
                        handler: self.handler.name().to_string(),
                        source: Box::new(err),
                    })
                }
            }
        }
    }

    /// Open a cursor at the persisted position and pump events into the
    /// handler.
    ///
    /// Returns `Ok(())` when an event is not applied due to an OCC
    /// conflict, in which case the caller restarts consumption.
    async fn consume(&self, cancel: &CancelSignal) -> Result<()> {
        let resource = self.stream.id().as_bytes().to_vec();

        let mut current = self.handler.resource_version(&resource).await?;
        let offset = version::next_offset(&current)?;

        debug!(
            handler = %self.handler.name(),
            stream = %self.stream.id(),
            offset,
            "started consuming",
        );

        let filter = TypeFilter::of(self.handler.consumed_event_types());
        let mut cursor = self.stream.open(offset, filter).await?;

        loop {
            let envelope = match cursor.next(cancel).await {
                Ok(envelope) => envelope,
                Err(err) => {
                    cursor.close();
                    return Err(err);
                }
            };

            let next = version::encode_offset(envelope.offset);
            let timeout = self.apply_timeout(&envelope.event);
            let scope = EventScope::new(
                self.handler.name(),
                resource.clone(),
                envelope.offset,
                envelope.recorded_at,
                timeout,
            );

            let apply = self.handler.apply_event(
                &resource,
                &current,
                &next,
                &scope,
                &envelope.event,
            );

            let applied = tokio::select! {
                _ = cancel.canceled() => {
                    cursor.close();
                    return Err(SpoolError::Canceled);
                }
                result = async {
                    // The deadline starts once any in-flight compaction
                    // pass has released the handler.
                    let _gate = self.handler_gate.lock().await;
                    tokio::time::timeout(timeout, apply).await
                } => match result {
                    Ok(Ok(applied)) => applied,
                    Ok(Err(err)) => {
                        cursor.close();
                        return Err(err);
                    }
                    Err(_) => {
                        cursor.close();
                        return Err(SpoolError::Timeout(timeout));
                    }
                },
            };

            if !applied {
                info!(
                    handler = %self.handler.name(),
                    stream = %self.stream.id(),
                    offset = envelope.offset,
                    "optimistic concurrency conflict, restarting the consumer",
                );
                cursor.close();
                return Ok(());
            }

            current = next;
        }
    }

    /// Run compaction on a fixed interval until canceled or a non-timeout
    /// error occurs.
    ///
    /// A compaction pass that misses its deadline is logged and retried at
    /// the next tick; compaction is advisory and a miss never fails the
    /// run. Each pass takes the handler gate, so consumption waits for at
    /// most one compaction deadline before applying its next event.
    async fn compact_loop(&self, cancel: &CancelSignal) -> Result<()> {
        let interval = or_default(self.config.compact_interval, DEFAULT_COMPACT_INTERVAL);
        let deadline = or_default(self.config.compact_timeout, DEFAULT_COMPACT_TIMEOUT);

        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = cancel.canceled() => return Err(SpoolError::Canceled),
                _ = ticker.tick() => {}
            }

            let scope = CompactScope::new(self.handler.name());
            let compact = self.handler.compact(&scope);

            tokio::select! {
                _ = cancel.canceled() => return Err(SpoolError::Canceled),
                result = async {
                    // The deadline starts once any in-flight apply has
                    // released the handler.
                    let _gate = self.handler_gate.lock().await;
                    tokio::time::timeout(deadline, compact).await
                } => match result {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) if cancel.is_canceled() => return Err(SpoolError::Canceled),
                    Ok(Err(err)) => {
                        return Err(SpoolError::Compact {
                            handler: self.handler.name().to_string(),
                            source: Box::new(err),
                        })
                    }
                    Err(_) => {
                        warn!(
                            handler = %self.handler.name(),
                            deadline = ?deadline,
                            "compaction timed out, retrying at the next interval",
                        );
                    }
                },
            }
        }
    }

    /// Resolve the effective deadline for applying an event.
    ///
    /// Precedence: handler hint, then the projector's configured default,
    /// then the global constant. A zero duration at any level means
    /// "unset" and falls through.
    fn apply_timeout(&self, event: &Event) -> Duration {
        let hint = self.handler.timeout_hint(event).unwrap_or(Duration::ZERO);
        if !hint.is_zero() {
            return hint;
        }
        or_default(self.config.apply_timeout, DEFAULT_APPLY_TIMEOUT)
    }
}
