//! The ordered event stream contract.

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::filter::TypeFilter;

/// An ordered sequence of event messages.
#[async_trait]
pub trait EventStream: Send + Sync {
    /// A unique identifier for the stream.
    ///
    /// The tuple of stream id and event offset uniquely identifies a message.
    fn id(&self) -> &str;

    /// Open a cursor used to read events from this stream.
    ///
    /// `offset` is the position of the first event to read; the first event
    /// on a stream is always at offset 0. It may refer to an already
    /// truncated or not-yet-appended position without error at open time,
    /// but opening a sealed stream at or past its end fails with
    /// [`SpoolError::Sealed`](crate::SpoolError::Sealed) because there is
    /// provably nothing left to read.
    ///
    /// An empty `filter` passes all event types.
    async fn open(&self, offset: u64, filter: TypeFilter) -> Result<Box<dyn StreamCursor>>;
}

/// A cursor reading events from a stream.
///
/// A cursor has exactly one logical reader; it is not safe to call `next`
/// from multiple tasks concurrently. `close` is safe from any task.
#[async_trait]
pub trait StreamCursor: Send {
    /// Return the next event at or after the cursor's offset that matches
    /// the filter, advancing past skipped positions.
    ///
    /// If no matching event is currently available, suspends until one is
    /// appended, the stream is sealed (`Sealed`), the cursor is closed
    /// (`CursorClosed`), or `cancel` fires (`Canceled`). Reading behind the
    /// stream's retained window fails with `Truncated`.
    async fn next(&mut self, cancel: &CancelSignal) -> Result<Envelope>;

    /// Stop the cursor.
    ///
    /// Idempotent; wakes any suspended `next` with `CursorClosed`. Safe to
    /// call multiple times and from a different task than the reader.
    fn close(&self);
}
