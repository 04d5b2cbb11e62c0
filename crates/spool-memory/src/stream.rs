use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use spool_core::{
    CancelSignal, Envelope, Event, EventStream, Result, SpoolError, StreamCursor, TypeFilter,
};

/// State shared between a stream and its cursors.
///
/// A single mutex guards every read and write so that appends, opens,
/// truncation, sealing and the scan-and-register step of a blocked read
/// are atomic with respect to each other.
struct Shared {
    state: Mutex<State>,
    /// Broadcast once per append batch, on seal, and on cursor close.
    /// Readers enable their `Notified` future while still holding the
    /// state lock, so a wake-up between scan and await cannot be missed.
    readable: Notify,
}

#[derive(Default)]
struct State {
    /// Offset of the oldest retained event.
    first: u64,
    /// Offset assigned to the next appended event.
    next: u64,
    /// Monotonic: once sealed, a stream never accepts another event.
    sealed: bool,
    /// Retained envelopes, indexed by `offset - first`.
    envelopes: Vec<Envelope>,
}

/// An ordered event stream that stores envelopes in memory.
///
/// Volatile and test-oriented; production logs are external collaborators
/// implementing the same [`EventStream`] contract.
pub struct MemoryStream {
    id: String,
    shared: Arc<Shared>,
}

impl MemoryStream {
    /// Create an empty stream.
    ///
    /// Panics if `id` is empty: the stream id doubles as the OCC resource
    /// key, so an unset id is a fatal precondition violation.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.is_empty(), "stream id must not be empty");
        Self {
            id,
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                readable: Notify::new(),
            }),
        }
    }

    /// Append events to the end of the stream, assigning consecutive
    /// offsets, and wake every blocked reader once for the whole batch.
    ///
    /// Returns the offset assigned to the first event of the batch, or
    /// [`SpoolError::Sealed`] if the stream has been sealed.
    pub fn append(&self, recorded_at: DateTime<Utc>, events: Vec<Event>) -> Result<u64> {
        let mut state = self.shared.state.lock();
        if state.sealed {
            return Err(SpoolError::Sealed);
        }

        let first_assigned = state.next;
        for event in events {
            let offset = state.next;
            state.next += 1;
            state.envelopes.push(Envelope {
                offset,
                recorded_at,
                event,
            });
        }
        drop(state);

        self.shared.readable.notify_waiters();
        Ok(first_assigned)
    }

    /// Discard any events before the given offset.
    ///
    /// Returns the number of events discarded; 0 if the stream is already
    /// truncated to or past that point. Panics if `offset` is greater than
    /// the next offset to be assigned.
    pub fn truncate(&self, offset: u64) -> u64 {
        let mut state = self.shared.state.lock();
        assert!(
            offset <= state.next,
            "cannot truncate stream to offset {}, next offset is {}",
            offset,
            state.next,
        );

        if offset <= state.first {
            return 0;
        }

        let count = offset - state.first;
        state.envelopes.drain(..count as usize);
        state.first = offset;
        count
    }

    /// Permanently mark the stream as complete.
    ///
    /// Idempotent. Every blocked reader is woken so it observes `Sealed`
    /// instead of waiting for events that will never arrive.
    pub fn seal(&self) {
        let mut state = self.shared.state.lock();
        state.sealed = true;
        drop(state);

        self.shared.readable.notify_waiters();
    }

    pub fn sealed(&self) -> bool {
        self.shared.state.lock().sealed
    }

    /// Offset of the oldest retained event.
    pub fn first_offset(&self) -> u64 {
        self.shared.state.lock().first
    }

    /// Offset that will be assigned to the next appended event.
    pub fn next_offset(&self) -> u64 {
        self.shared.state.lock().next
    }

    /// Open a cursor at `offset`, returning the concrete cursor type.
    ///
    /// The [`EventStream::open`] implementation delegates here; callers that
    /// need [`MemoryCursor::closer`] use this form directly.
    pub fn open_cursor(&self, offset: u64, filter: TypeFilter) -> Result<MemoryCursor> {
        let state = self.shared.state.lock();
        if state.sealed && offset >= state.next {
            // Provably nothing left to read; fail now rather than hang.
            return Err(SpoolError::Sealed);
        }
        drop(state);

        Ok(MemoryCursor {
            shared: self.shared.clone(),
            offset,
            filter,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }
}

#[async_trait]
impl EventStream for MemoryStream {
    fn id(&self) -> &str {
        &self.id
    }

    async fn open(&self, offset: u64, filter: TypeFilter) -> Result<Box<dyn StreamCursor>> {
        Ok(Box::new(self.open_cursor(offset, filter)?))
    }
}

/// A cursor over a [`MemoryStream`].
///
/// Owned by a single logical reader. Dropping the cursor closes it.
pub struct MemoryCursor {
    shared: Arc<Shared>,
    offset: u64,
    filter: TypeFilter,
    closed: Arc<AtomicBool>,
}

impl MemoryCursor {
    /// A detached handle that can close this cursor from another task,
    /// including while the reader is suspended in `next`.
    pub fn closer(&self) -> CursorCloser {
        CursorCloser {
            shared: self.shared.clone(),
            closed: self.closed.clone(),
        }
    }
}

#[async_trait]
impl StreamCursor for MemoryCursor {
    async fn next(&mut self, cancel: &CancelSignal) -> Result<Envelope> {
        loop {
            // Create the wake-up future before inspecting the closed flag;
            // a close broadcast from here on is observed at `enable`, so a
            // close landing between the check and the await cannot strand
            // the reader.
            let notified = self.shared.readable.notified();
            tokio::pin!(notified);

            if cancel.is_canceled() {
                return Err(SpoolError::Canceled);
            }
            if self.closed.load(Ordering::Acquire) {
                return Err(SpoolError::CursorClosed);
            }

            {
                let state = self.shared.state.lock();

                if self.offset < state.first {
                    return Err(SpoolError::Truncated {
                        requested: self.offset,
                        first: state.first,
                    });
                }

                while self.offset < state.next {
                    let index = (self.offset - state.first) as usize;
                    let envelope = &state.envelopes[index];
                    self.offset += 1;

                    if self.filter.matches(&envelope.event) {
                        return Ok(envelope.clone());
                    }
                }

                if state.sealed {
                    return Err(SpoolError::Sealed);
                }

                // Register for the next broadcast before releasing the lock;
                // an append or seal that wins the lock after this point will
                // wake the future even if we have not started awaiting yet.
                notified.as_mut().enable();
            }

            tokio::select! {
                _ = cancel.canceled() => return Err(SpoolError::Canceled),
                _ = &mut notified => {}
            }
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shared.readable.notify_waiters();
        }
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.close();
    }
}

/// A cloneable handle that closes one cursor.
///
/// Closing is one-shot and idempotent; racing closes are safe.
#[derive(Clone)]
pub struct CursorCloser {
    shared: Arc<Shared>,
    closed: Arc<AtomicBool>,
}

impl CursorCloser {
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shared.readable.notify_waiters();
        }
    }
}
