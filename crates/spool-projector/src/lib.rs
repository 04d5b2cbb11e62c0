//! Spool Projector: the event consumption engine.
//!
//! Reads events from an ordered stream and applies them to a projection
//! handler exactly once per offset:
//! - Resumes from the handler's persisted OCC version
//! - Restarts the cursor on optimistic concurrency conflicts
//! - Enforces a per-event deadline with documented precedence
//! - Runs compaction on a concurrent, supervised sibling task

pub mod config;
pub mod projector;

pub use config::{
    ProjectorConfig, DEFAULT_APPLY_TIMEOUT, DEFAULT_COMPACT_INTERVAL, DEFAULT_COMPACT_TIMEOUT,
};
pub use projector::Projector;
