//! Time-ordered identifiers.
//!
//! An id is `{millis:012x}{sequence:08x}{random:08x}`: the creation timestamp,
//! a process-wide sequence and a random tail. Ids sort by creation time as
//! plain strings, never repeat within a process, and are unlikely to collide
//! across processes, so no central allocator is needed.

use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generates an id for an entity created at `created_at` (ms since epoch).
pub fn generate_id(created_at: u64) -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let tail: u32 = rand::thread_rng().gen();
    format!(
        "{:012x}{:08x}{:08x}",
        created_at & 0xffff_ffff_ffff,
        sequence,
        tail
    )
}
