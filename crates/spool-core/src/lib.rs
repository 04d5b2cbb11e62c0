//! Spool Core: traits and types for the spool projection engine
//!
//! This crate defines the core abstractions shared by every spool crate:
//! - Event stream contract: an ordered, filterable, blocking log of envelopes
//! - Projection handler: the capability set a host application implements
//! - OCC versions: the optimistic-concurrency token and its wire codec
//! - Cancellation: a handle/signal pair that promptly unblocks suspended waits
//!
//! Key properties:
//! - Offsets are dense, zero-based, and strictly increasing per stream
//! - A stream id together with an offset uniquely identifies a message
//! - `applied = false` from a handler is normal control flow, never a failure

pub mod cancel;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod handler;
pub mod scope;
pub mod stream;
pub mod version;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use envelope::{Envelope, Event};
pub use error::{Result, SpoolError};
pub use filter::TypeFilter;
pub use handler::ProjectionHandler;
pub use scope::{CompactScope, EventScope};
pub use stream::{EventStream, StreamCursor};
