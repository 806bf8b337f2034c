//! Parent/child adjacency for nested boards.
//!
//! A parent's `children_ids` is the only record of which boards hang below it.
//! Both mutations are read-modify-write cycles on the parent's content record
//! under the parent-update lock, and both are idempotent.

use crate::error::Result;
use crate::forum::board::Board;
use crate::forum::constants::CF_CONTENT;
use crate::forum::keys::{content_key, EntityKind};
use crate::forum::locks::LockDomains;
use crate::storage::RocksDbHandle;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maintains `children_ids` on board records.
#[derive(Debug, Clone)]
pub struct HierarchyManager {
    db: RocksDbHandle,
    locks: Arc<LockDomains>,
}

impl HierarchyManager {
    pub fn new(db: RocksDbHandle, locks: Arc<LockDomains>) -> Self {
        Self { db, locks }
    }

    /// Appends `child_id` to the parent's children unless already present.
    ///
    /// Returns true if the list changed. A missing parent is a no-op.
    pub fn add_child(&self, child_id: &str, parent_id: &str) -> Result<bool> {
        let _guard = self.locks.parent_update.acquire();
        self.attach(child_id, parent_id)
    }

    /// Removes `child_id` from the parent's children.
    ///
    /// An emptied list is stored as absent. Returns true if the list changed.
    pub fn remove_child(&self, child_id: &str, parent_id: &str) -> Result<bool> {
        let _guard = self.locks.parent_update.acquire();
        self.detach(child_id, parent_id)
    }

    /// Unlocked [`add_child`](Self::add_child); the caller holds the parent-update lock.
    pub(crate) fn attach(&self, child_id: &str, parent_id: &str) -> Result<bool> {
        let key = content_key(EntityKind::Board, parent_id);

        let mut parent: Board = match self.db.get(CF_CONTENT, &key)? {
            Some(parent) => parent,
            None => {
                warn!(child_id, parent_id, "Parent board missing, child not attached");
                return Ok(false);
            }
        };

        let children = parent.children_ids.get_or_insert_with(Vec::new);
        if children.iter().any(|id| id == child_id) {
            debug!(child_id, parent_id, "Child already attached");
            return Ok(false);
        }
        children.push(child_id.to_string());

        self.db.put(CF_CONTENT, &key, &parent)?;
        debug!(child_id, parent_id, "Attached child board");
        Ok(true)
    }

    /// Unlocked [`remove_child`](Self::remove_child); the caller holds the parent-update lock.
    pub(crate) fn detach(&self, child_id: &str, parent_id: &str) -> Result<bool> {
        let key = content_key(EntityKind::Board, parent_id);

        let mut parent: Board = match self.db.get(CF_CONTENT, &key)? {
            Some(parent) => parent,
            None => {
                warn!(child_id, parent_id, "Parent board missing, nothing to detach");
                return Ok(false);
            }
        };

        let before = parent.children().len();
        let remaining: Vec<String> = parent
            .children()
            .iter()
            .filter(|id| id.as_str() != child_id)
            .cloned()
            .collect();
        if remaining.len() == before {
            return Ok(false);
        }
        parent.children_ids = if remaining.is_empty() {
            None
        } else {
            Some(remaining)
        };

        self.db.put(CF_CONTENT, &key, &parent)?;
        debug!(child_id, parent_id, "Detached child board");
        Ok(true)
    }
}
