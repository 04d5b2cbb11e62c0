//! In-memory reference implementation of the spool event stream.
//!
//! [`MemoryStream`] is a concurrency-safe, volatile stream intended
//! primarily for testing and as the reference for the stream contract:
//! - Append with dense, zero-based offsets
//! - Filtered open-at-offset cursors with blocking reads
//! - Truncation of a prefix and permanent sealing
//! - Race-free wake-up of every blocked reader on append, seal and close

pub mod stream;

pub use stream::{CursorCloser, MemoryCursor, MemoryStream};
