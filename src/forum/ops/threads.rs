//! Thread lifecycle, board listings and view counts.

use crate::error::Result;
use crate::forum::board::Board;
use crate::forum::constants::{CF_CONTENT, CF_DELETED, CF_METADATA};
use crate::forum::counters::decode_count;
use crate::forum::id::generate_id;
use crate::forum::index::ListingIndex;
use crate::forum::keys::{content_key, metadata_key, EntityKind};
use crate::forum::storage::ForumStorage;
use crate::forum::thread::{NewThread, PurgedThread, Thread, ThreadSummary, THREAD_SUMMARY_FIELDS};
use crate::forum::types::{
    current_timestamp_millis, LegacyImport, MetadataField, PageRequest, THREAD_FIELDS,
};
use tracing::{debug, info, warn};

/// Counters a new thread starts with.
const THREAD_COUNTERS: &[MetadataField] = &[MetadataField::PostCount, MetadataField::ViewCount];

impl ForumStorage {
    /// Creates a thread in an existing board and appends it to the board's listing.
    pub fn create_thread(&self, new: NewThread) -> Result<Thread> {
        self.insert_thread(new, current_timestamp_millis(), None, None)
    }

    /// Imports a thread from the old system.
    ///
    /// A `legacy_parent_id` names the old board id and replaces `board_id`.
    pub fn import_thread(&self, mut new: NewThread, legacy: LegacyImport) -> Result<Thread> {
        if let Some(legacy_id) = legacy.legacy_id {
            self.ensure_legacy_free(EntityKind::Thread, legacy_id)?;
        }
        if let Some(legacy_board_id) = legacy.legacy_parent_id {
            new.board_id = self.resolve_legacy(EntityKind::Board, legacy_board_id)?;
        }

        let now = current_timestamp_millis();
        let thread = self.insert_thread(
            new,
            legacy.created_at.unwrap_or(now),
            Some(now),
            legacy.legacy_id,
        )?;

        if let Some(legacy_id) = legacy.legacy_id {
            self.map_legacy(EntityKind::Thread, legacy_id, &thread.id)?;
        }
        Ok(thread)
    }

    fn insert_thread(
        &self,
        new: NewThread,
        created_at: u64,
        imported_at: Option<u64>,
        legacy_id: Option<u64>,
    ) -> Result<Thread> {
        self.load_record::<Board>(EntityKind::Board, &new.board_id)?;

        let thread = Thread {
            id: generate_id(created_at),
            board_id: new.board_id,
            created_at,
            updated_at: created_at,
            imported_at,
            deleted: false,
            legacy_id,
        };

        self.store_record(EntityKind::Thread, &thread.id, &thread)?;
        self.zero_counters(EntityKind::Thread, &thread.id, THREAD_COUNTERS)?;
        self.inc_thread_count(&thread.board_id)?;

        let rank = self
            .index
            .append(ListingIndex::BoardThreads, &thread.board_id, &thread.id)?;
        self.counters
            .set_count(EntityKind::Thread, &thread.id, MetadataField::IndexRank, rank)?;

        debug!(thread_id = %thread.id, board_id = %thread.board_id, rank, "Created thread");
        Ok(thread)
    }

    /// Reads a thread joined with its derived fields.
    pub fn find_thread(&self, id: &str) -> Result<ThreadSummary> {
        let thread: Thread = self.load_record(EntityKind::Thread, id)?;
        self.summarize_thread(thread)
    }

    fn summarize_thread(&self, thread: Thread) -> Result<ThreadSummary> {
        let fields = self
            .counters
            .load_fields(EntityKind::Thread, &thread.id, THREAD_SUMMARY_FIELDS)?;
        let mut summary = ThreadSummary::new(thread);
        for (field, value) in fields {
            if let Some(value) = value {
                summary.apply_metadata(field, value);
            }
        }
        Ok(summary)
    }

    /// Looks a thread up by its old-system id.
    pub fn thread_by_old_id(&self, legacy_id: u64) -> Result<ThreadSummary> {
        let id = self.resolve_legacy(EntityKind::Thread, legacy_id)?;
        self.find_thread(&id)
    }

    /// Every stored thread in id order.
    pub fn all_threads(&self) -> Result<Vec<Thread>> {
        self.scan_records(EntityKind::Thread)
    }

    /// One page of a board's threads in creation order.
    ///
    /// Index entries whose thread record is gone are skipped.
    pub fn threads_by_board(
        &self,
        board_id: &str,
        page: PageRequest,
    ) -> Result<Vec<ThreadSummary>> {
        let entries = self.index.page(ListingIndex::BoardThreads, board_id, page)?;

        let mut threads = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.find_thread(&entry.id) {
                Ok(summary) => threads.push(summary),
                Err(e) if e.is_not_found() => {
                    warn!(
                        board_id,
                        thread_id = %entry.id,
                        rank = entry.rank,
                        "Stale thread index entry"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(threads)
    }

    fn set_thread_deleted(&self, id: &str, deleted: bool) -> Result<Thread> {
        let mut thread: Thread = self.load_record(EntityKind::Thread, id)?;
        thread.deleted = deleted;
        thread.updated_at = current_timestamp_millis();
        self.store_record(EntityKind::Thread, id, &thread)?;
        Ok(thread)
    }

    /// Soft-deletes a thread. Its metadata and index entry stay.
    pub fn delete_thread(&self, id: &str) -> Result<Thread> {
        self.set_thread_deleted(id, true)
    }

    pub fn undelete_thread(&self, id: &str) -> Result<Thread> {
        self.set_thread_deleted(id, false)
    }

    /// Permanently removes a thread, archiving it with its view count.
    ///
    /// The board's thread count drops once, when the index entry is removed.
    /// The thread's post listing is dropped; the post records stay in place.
    pub fn purge_thread(&self, id: &str) -> Result<PurgedThread> {
        let thread: Thread = self.load_record(EntityKind::Thread, id)?;
        let key = content_key(EntityKind::Thread, id);

        let mut view_count = self.counters.read(&metadata_key(
            EntityKind::Thread,
            id,
            MetadataField::ViewCount,
        ))?;
        if let Some(archived) = self.db.get::<PurgedThread>(CF_DELETED, &key)? {
            // Retried purge: metadata may already be gone.
            view_count = view_count.max(archived.view_count);
        }

        let rank = self
            .db
            .get_raw(
                CF_METADATA,
                &metadata_key(EntityKind::Thread, id, MetadataField::IndexRank),
            )?
            .map(|bytes| decode_count(&bytes));
        if let Some(rank) = rank {
            if self
                .index
                .remove(ListingIndex::BoardThreads, &thread.board_id, rank)?
            {
                match self.dec_thread_count(&thread.board_id) {
                    Ok(_) => {}
                    Err(e) if e.is_not_found() => {
                        warn!(thread_id = id, board_id = %thread.board_id, "Board already purged");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        self.index.clear(ListingIndex::ThreadPosts, id)?;
        self.delete_metadata(EntityKind::Thread, id, THREAD_FIELDS)?;
        if let Some(legacy_id) = thread.legacy_id {
            self.unmap_legacy(EntityKind::Thread, legacy_id)?;
        }

        let purged = PurgedThread { thread, view_count };
        self.db.put(CF_DELETED, &key, &purged)?;
        self.db.delete(CF_CONTENT, &key)?;

        info!(thread_id = id, view_count, "Purged thread");
        Ok(purged)
    }

    /// Counts one view. Returns the new view count.
    pub fn inc_view_count(&self, thread_id: &str) -> Result<u64> {
        self.load_record::<Thread>(EntityKind::Thread, thread_id)?;
        let key = metadata_key(EntityKind::Thread, thread_id, MetadataField::ViewCount);
        self.counters.increment(&self.locks.thread_count, &key)
    }
}
