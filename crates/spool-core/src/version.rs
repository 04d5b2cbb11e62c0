//! Wire codec for the OCC version token.
//!
//! A persisted version has exactly two legal shapes: empty, meaning no
//! events have been applied yet, or 8 bytes holding the big-endian offset
//! of the last applied event. Any other length is a corruption error.

use crate::error::{Result, SpoolError};

/// Decode a persisted version into the offset of the next event to consume.
///
/// An empty version resumes from offset 0. An 8-byte version encoding
/// offset N resumes from N + 1, so the event at N is never re-delivered.
pub fn next_offset(version: &[u8]) -> Result<u64> {
    match version.len() {
        0 => Ok(0),
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(version);
            Ok(u64::from_be_bytes(buf) + 1)
        }
        n => Err(SpoolError::MalformedVersion(n)),
    }
}

/// Encode the version recording `offset` as the last applied offset.
pub fn encode_offset(offset: u64) -> Vec<u8> {
    offset.to_be_bytes().to_vec()
}
