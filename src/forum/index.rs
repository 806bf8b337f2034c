//! Append-only, rank-ordered listing indexes.
//!
//! Each owner (a board for threads, a thread for posts) has its own index.
//! Entries are `child~owner~order~{rank:016x} -> child_id`, and ranks come
//! from a counter on the owner, starting at 1. A page is one range scan
//! starting at the page's first rank; ranks freed by purges are simply
//! skipped by the scan.

use crate::error::Result;
use crate::forum::constants::{CF_INDEXES, RANGE_END};
use crate::forum::counters::{CounterEngine, Direction};
use crate::forum::keys::{
    decode_rank, metadata_key, order_index_key, order_index_prefix, EntityKind,
};
use crate::forum::locks::LockDomains;
use crate::forum::types::{MetadataField, PageRequest};
use crate::storage::{BatchOp, RocksDbHandle};
use std::sync::Arc;
use tracing::debug;

/// The two listing indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingIndex {
    /// Threads of a board.
    BoardThreads,
    /// Posts of a thread.
    ThreadPosts,
}

impl ListingIndex {
    fn child(self) -> EntityKind {
        match self {
            ListingIndex::BoardThreads => EntityKind::Thread,
            ListingIndex::ThreadPosts => EntityKind::Post,
        }
    }

    fn owner(self) -> EntityKind {
        match self {
            ListingIndex::BoardThreads => EntityKind::Board,
            ListingIndex::ThreadPosts => EntityKind::Thread,
        }
    }

    fn order_field(self) -> MetadataField {
        match self {
            ListingIndex::BoardThreads => MetadataField::ThreadOrder,
            ListingIndex::ThreadPosts => MetadataField::PostOrder,
        }
    }
}

/// One index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub rank: u64,
    pub id: String,
}

/// Writes, removes and pages through listing index entries.
#[derive(Debug, Clone)]
pub struct IndexManager {
    db: RocksDbHandle,
    counters: CounterEngine,
    locks: Arc<LockDomains>,
}

impl IndexManager {
    pub fn new(db: RocksDbHandle, counters: CounterEngine, locks: Arc<LockDomains>) -> Self {
        Self {
            db,
            counters,
            locks,
        }
    }

    /// Allocates the next rank for `owner_id`.
    ///
    /// Thread ranks are allocated under the thread-count domain, post ranks
    /// under the post-count domain.
    pub fn allocate_rank(&self, index: ListingIndex, owner_id: &str) -> Result<u64> {
        let domain = match index {
            ListingIndex::BoardThreads => &self.locks.thread_count,
            ListingIndex::ThreadPosts => &self.locks.post_count,
        };
        let key = metadata_key(index.owner(), owner_id, index.order_field());
        self.counters.change(domain, &key, Direction::Increment)
    }

    /// Allocates a rank and writes the entry for `child_id`. Returns the rank.
    pub fn append(&self, index: ListingIndex, owner_id: &str, child_id: &str) -> Result<u64> {
        let rank = self.allocate_rank(index, owner_id)?;
        let key = order_index_key(index.child(), owner_id, rank);
        self.db.put_raw(CF_INDEXES, &key, child_id.as_bytes())?;
        debug!(?index, owner_id, child_id, rank, "Appended index entry");
        Ok(rank)
    }

    /// Deletes the entry at `rank`. Returns true if it existed.
    pub fn remove(&self, index: ListingIndex, owner_id: &str, rank: u64) -> Result<bool> {
        let key = order_index_key(index.child(), owner_id, rank);
        if !self.db.exists(CF_INDEXES, &key)? {
            return Ok(false);
        }
        self.db.delete(CF_INDEXES, &key)?;
        debug!(?index, owner_id, rank, "Removed index entry");
        Ok(true)
    }

    /// Returns one page of entries in rank order.
    pub fn page(
        &self,
        index: ListingIndex,
        owner_id: &str,
        request: PageRequest,
    ) -> Result<Vec<IndexEntry>> {
        let prefix = order_index_prefix(index.child(), owner_id);
        let start = order_index_key(index.child(), owner_id, request.first_rank());
        let mut end = prefix.clone();
        end.push(RANGE_END);

        let entries = self
            .db
            .scan(CF_INDEXES, &start, &end, Some(request.limit))?
            .into_iter()
            .filter_map(|(key, value)| {
                let rank = decode_rank(&key[prefix.len()..])?;
                let id = String::from_utf8(value).ok()?;
                Some(IndexEntry { rank, id })
            })
            .collect();

        Ok(entries)
    }

    /// Deletes every entry of `owner_id`'s index in one batch. Returns how many went.
    pub fn clear(&self, index: ListingIndex, owner_id: &str) -> Result<usize> {
        let prefix = order_index_prefix(index.child(), owner_id);
        let ops: Vec<BatchOp> = self
            .db
            .scan_prefix(CF_INDEXES, &prefix)?
            .into_iter()
            .map(|(key, _)| BatchOp::delete(key))
            .collect();
        let removed = ops.len();
        self.db.batch(CF_INDEXES, &ops)?;
        debug!(?index, owner_id, removed, "Cleared index");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::constants::{KEY_SPACES, MAX_HIERARCHY_DEPTH};
    use crate::storage::RocksDbConfig;
    use tempfile::TempDir;

    fn create_index() -> (IndexManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = RocksDbHandle::open(
            temp_dir.path().join("db"),
            &RocksDbConfig::default(),
            KEY_SPACES,
        )
        .expect("Failed to open db");
        let locks = Arc::new(LockDomains::default());
        let counters = CounterEngine::new(db.clone(), locks.clone(), MAX_HIERARCHY_DEPTH);
        (IndexManager::new(db, counters, locks), temp_dir)
    }

    #[test]
    fn test_ranks_start_at_one() {
        let (index, _temp) = create_index();
        assert_eq!(index.append(ListingIndex::BoardThreads, "b", "t1").unwrap(), 1);
        assert_eq!(index.append(ListingIndex::BoardThreads, "b", "t2").unwrap(), 2);
        assert_eq!(index.append(ListingIndex::BoardThreads, "other", "t3").unwrap(), 1);
    }

    #[test]
    fn test_clear_drops_only_one_owner() {
        let (index, _temp) = create_index();
        for i in 1..=3 {
            index
                .append(ListingIndex::ThreadPosts, "t1", &format!("p{}", i))
                .unwrap();
        }
        index.append(ListingIndex::ThreadPosts, "t10", "q1").unwrap();

        assert_eq!(index.clear(ListingIndex::ThreadPosts, "t1").unwrap(), 3);
        assert_eq!(index.clear(ListingIndex::ThreadPosts, "t1").unwrap(), 0);

        let gone = index
            .page(ListingIndex::ThreadPosts, "t1", PageRequest::default())
            .unwrap();
        assert!(gone.is_empty());
        let kept = index
            .page(ListingIndex::ThreadPosts, "t10", PageRequest::default())
            .unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_second_page() {
        let (index, _temp) = create_index();
        for i in 1..=25 {
            index
                .append(ListingIndex::BoardThreads, "b", &format!("t{}", i))
                .unwrap();
        }

        let page = index
            .page(ListingIndex::BoardThreads, "b", PageRequest::new(10, 2))
            .unwrap();
        let ranks: Vec<u64> = page.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (11..=20).collect::<Vec<_>>());
        assert_eq!(page[0].id, "t11");

        let last = index
            .page(ListingIndex::BoardThreads, "b", PageRequest::new(10, 3))
            .unwrap();
        assert_eq!(last.len(), 5);

        let beyond = index
            .page(ListingIndex::BoardThreads, "b", PageRequest::new(10, 4))
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_removed_ranks_are_skipped() {
        let (index, _temp) = create_index();
        for i in 1..=5 {
            index
                .append(ListingIndex::ThreadPosts, "t", &format!("p{}", i))
                .unwrap();
        }
        assert!(index.remove(ListingIndex::ThreadPosts, "t", 2).unwrap());
        assert!(!index.remove(ListingIndex::ThreadPosts, "t", 2).unwrap());

        let page = index
            .page(ListingIndex::ThreadPosts, "t", PageRequest::new(3, 1))
            .unwrap();
        let ids: Vec<&str> = page.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3", "p4"]);
    }

    #[test]
    fn test_indexes_do_not_bleed_between_owners() {
        let (index, _temp) = create_index();
        index.append(ListingIndex::BoardThreads, "b1", "a").unwrap();
        index.append(ListingIndex::BoardThreads, "b10", "b").unwrap();

        let page = index
            .page(ListingIndex::BoardThreads, "b1", PageRequest::default())
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "a");
    }
}
