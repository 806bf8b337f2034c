//! Counter engine: locked increments/decrements and board-hierarchy propagation.
//!
//! Counters live in the metadata space as big-endian `u64`. Every change is a
//! read-modify-write under the lock domain of its counter class; a missing or
//! malformed value reads as 0 and decrements floor at 0.
//!
//! Changing a board's own `post_count`/`thread_count` also changes its
//! `total_*` counter and then the `total_*` counters of each ancestor found by
//! following `parent_id`. The walk only moves on to the parent while the
//! total just computed is greater than zero, so a decrement that lands on 0
//! stops there. Increments always reach the root.

use crate::error::{ForumError, Result};
use crate::forum::board::Board;
use crate::forum::constants::{CF_CONTENT, CF_METADATA};
use crate::forum::keys::{content_key, metadata_key, EntityKind};
use crate::forum::locks::{LockDomain, LockDomains};
use crate::forum::types::MetadataField;
use crate::storage::RocksDbHandle;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Direction of a counter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increment,
    Decrement,
}

impl Direction {
    fn apply(self, current: u64) -> u64 {
        match self {
            Direction::Increment => current.saturating_add(1),
            Direction::Decrement => current.saturating_sub(1),
        }
    }
}

/// Board counters that propagate into ancestor totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCounter {
    Posts,
    Threads,
}

impl BoardCounter {
    /// The board's own counter.
    pub fn local_field(self) -> MetadataField {
        match self {
            BoardCounter::Posts => MetadataField::PostCount,
            BoardCounter::Threads => MetadataField::ThreadCount,
        }
    }

    /// The aggregate counter walked up the hierarchy.
    pub fn total_field(self) -> MetadataField {
        match self {
            BoardCounter::Posts => MetadataField::TotalPostCount,
            BoardCounter::Threads => MetadataField::TotalThreadCount,
        }
    }
}

/// A decoded metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Count(u64),
    Text(String),
}

/// Decodes a stored counter; anything that is not 8 bytes reads as 0.
pub fn decode_count(bytes: &[u8]) -> u64 {
    match <[u8; 8]>::try_from(bytes) {
        Ok(raw) => u64::from_be_bytes(raw),
        Err(_) => {
            warn!(len = bytes.len(), "Malformed counter value, treating as 0");
            0
        }
    }
}

/// Locked counter operations over the metadata space.
#[derive(Debug, Clone)]
pub struct CounterEngine {
    db: RocksDbHandle,
    locks: Arc<LockDomains>,
    max_depth: usize,
}

impl CounterEngine {
    /// Creates a counter engine sharing the store's lock domains.
    pub fn new(db: RocksDbHandle, locks: Arc<LockDomains>, max_depth: usize) -> Self {
        Self {
            db,
            locks,
            max_depth: max_depth.max(1),
        }
    }

    /// Reads a counter without locking. Missing reads as 0.
    pub fn read(&self, key: &[u8]) -> Result<u64> {
        Ok(self
            .db
            .get_raw(CF_METADATA, key)?
            .map(|bytes| decode_count(&bytes))
            .unwrap_or(0))
    }

    /// Increments a counter under `domain` and returns the new value.
    pub fn increment(&self, domain: &LockDomain, key: &[u8]) -> Result<u64> {
        self.change(domain, key, Direction::Increment)
    }

    /// Decrements a counter under `domain`, flooring at 0, and returns the new value.
    pub fn decrement(&self, domain: &LockDomain, key: &[u8]) -> Result<u64> {
        self.change(domain, key, Direction::Decrement)
    }

    /// One critical section: read, compute, write, release.
    pub fn change(&self, domain: &LockDomain, key: &[u8], direction: Direction) -> Result<u64> {
        let _guard = domain.acquire();
        let current = self.read(key)?;
        let next = direction.apply(current);
        self.db.put_raw(CF_METADATA, key, &next.to_be_bytes())?;
        trace!(
            domain = domain.name(),
            key_len = key.len(),
            from = current,
            to = next,
            "counter: updated"
        );
        Ok(next)
    }

    /// Lock domain that guards a board counter class.
    pub fn domain_for(&self, counter: BoardCounter) -> &LockDomain {
        match counter {
            BoardCounter::Posts => &self.locks.post_count,
            BoardCounter::Threads => &self.locks.thread_count,
        }
    }

    /// Changes a board's own counter, then walks the change up the totals.
    ///
    /// Returns the board's new local count. Fails with `NotFound`, writing
    /// nothing, if the board has no content record.
    pub fn change_board_count(
        &self,
        board_id: &str,
        counter: BoardCounter,
        direction: Direction,
    ) -> Result<u64> {
        if !self
            .db
            .exists(CF_CONTENT, &content_key(EntityKind::Board, board_id))?
        {
            return Err(ForumError::not_found(format!("Board {}", board_id)));
        }

        let local_key = metadata_key(EntityKind::Board, board_id, counter.local_field());
        let count = self.change(self.domain_for(counter), &local_key, direction)?;
        self.propagate_total(board_id, counter, direction)?;
        Ok(count)
    }

    /// Applies `direction` to the total counter of `board_id` and its ancestors.
    ///
    /// Each hop takes and releases the lock domain on its own. The walk stops
    /// at a board without a parent, at a total of 0, at a missing board
    /// record, at a repeated board (cycle) or at the configured depth.
    pub fn propagate_total(
        &self,
        board_id: &str,
        counter: BoardCounter,
        direction: Direction,
    ) -> Result<()> {
        let domain = self.domain_for(counter);
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = board_id.to_string();

        loop {
            if visited.len() >= self.max_depth {
                warn!(
                    board_id,
                    depth = visited.len(),
                    "Counter propagation hit maximum hierarchy depth"
                );
                break;
            }
            if !visited.insert(current.clone()) {
                warn!(
                    board_id,
                    repeated = %current,
                    "Parent cycle detected, stopping counter propagation"
                );
                break;
            }

            let record: Option<Board> = self
                .db
                .get(CF_CONTENT, &content_key(EntityKind::Board, &current))?;
            if record.is_none() {
                warn!(
                    board_id,
                    missing = %current,
                    "Board missing, stopping counter propagation"
                );
                break;
            }

            let total_key = metadata_key(EntityKind::Board, &current, counter.total_field());
            let total = self.change(domain, &total_key, direction)?;

            let Some(parent_id) = record.and_then(|board| board.parent_id) else {
                break;
            };
            if total == 0 {
                debug!(
                    board_id = %current,
                    parent_id = %parent_id,
                    field = %counter.total_field(),
                    "Total reached 0, not propagating to parent"
                );
                break;
            }
            current = parent_id;
        }

        Ok(())
    }

    /// Reads several metadata fields of one entity in a single batched read.
    ///
    /// Missing fields come back as `None`.
    pub fn load_fields(
        &self,
        kind: EntityKind,
        id: &str,
        fields: &[MetadataField],
    ) -> Result<Vec<(MetadataField, Option<MetadataValue>)>> {
        let keys: Vec<Vec<u8>> = fields
            .iter()
            .map(|field| metadata_key(kind, id, *field))
            .collect();
        let values = self.db.multi_get_raw(CF_METADATA, &keys)?;

        Ok(fields
            .iter()
            .zip(values)
            .map(|(field, raw)| {
                let value = raw.map(|bytes| {
                    if field.is_numeric() {
                        MetadataValue::Count(decode_count(&bytes))
                    } else {
                        MetadataValue::Text(String::from_utf8_lossy(&bytes).into_owned())
                    }
                });
                (*field, value)
            })
            .collect())
    }

    /// Writes a text field (denormalized "last post" data and friends).
    pub fn set_text(
        &self,
        kind: EntityKind,
        id: &str,
        field: MetadataField,
        value: &str,
    ) -> Result<()> {
        self.db
            .put_raw(CF_METADATA, &metadata_key(kind, id, field), value.as_bytes())
    }

    /// Writes a numeric field outright, without a read.
    pub fn set_count(
        &self,
        kind: EntityKind,
        id: &str,
        field: MetadataField,
        value: u64,
    ) -> Result<()> {
        self.db
            .put_raw(CF_METADATA, &metadata_key(kind, id, field), &value.to_be_bytes())
    }
}
