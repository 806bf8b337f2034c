//! Forum storage engine over RocksDB.
//!
//! `ForumStorage` owns the database handle, the lock domains and the managers
//! built on them. Entity operations live in [`crate::forum::ops`], one module
//! per entity type, as `impl ForumStorage` blocks.
//!
//! ## Storage Layout
//!
//! One column family per key space:
//! - `content`: `{type}~{id}` -> bincode record (boards, threads, posts)
//! - `metadata`: `{type}~{id}~{field}` -> big-endian u64 counter or UTF-8 text
//! - `indexes`: `thread~{board}~order~{rank}` / `post~{thread}~order~{rank}` -> child id,
//!   `category~{id}` -> bincode category
//! - `legacy`: `{type}~{old_id}` -> new id
//! - `deleted`: `{type}~{id}` -> archived record after a purge
//!
//! Multi-step operations are not atomic. Each step is idempotent and the
//! destructive steps come last, so a failed operation can be retried.

use crate::error::{ForumError, Result};
use crate::forum::config::ForumConfig;
use crate::forum::constants::{CF_CONTENT, CF_LEGACY, KEY_SPACES};
use crate::forum::counters::CounterEngine;
use crate::forum::hierarchy::HierarchyManager;
use crate::forum::index::IndexManager;
use crate::forum::keys::{content_key, legacy_key, type_range_end, type_range_start, EntityKind};
use crate::forum::locks::LockDomains;
use crate::forum::types::PageRequest;
use crate::storage::{decode, RocksDbHandle};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database subdirectory.
const DB_DIR: &str = "forum_db";

/// Persistent forum storage.
///
/// Cloning is cheap and clones share the database and the lock domains.
#[derive(Debug, Clone)]
pub struct ForumStorage {
    pub(crate) db: RocksDbHandle,
    pub(crate) config: ForumConfig,
    pub(crate) locks: Arc<LockDomains>,
    pub(crate) counters: CounterEngine,
    pub(crate) hierarchy: HierarchyManager,
    pub(crate) index: IndexManager,
}

impl ForumStorage {
    /// Opens storage in `data_dir` with default settings.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(ForumConfig::new(data_dir.as_ref()))
    }

    /// Opens (creating if needed) storage described by `config`.
    pub fn open(config: ForumConfig) -> Result<Self> {
        let db_path = config.data_dir.join(DB_DIR);
        let db = RocksDbHandle::open(&db_path, &config.rocksdb, KEY_SPACES)?;

        let locks = Arc::new(LockDomains::default());
        let counters = CounterEngine::new(db.clone(), locks.clone(), config.max_hierarchy_depth);
        let hierarchy = HierarchyManager::new(db.clone(), locks.clone());
        let index = IndexManager::new(db.clone(), counters.clone(), locks.clone());

        info!(path = %db_path.display(), "Opened forum storage");

        Ok(Self {
            db,
            config,
            locks,
            counters,
            hierarchy,
            index,
        })
    }

    /// The configuration this storage was opened with.
    pub fn config(&self) -> &ForumConfig {
        &self.config
    }

    /// Builds a page request from caller input, applying the configured default limit.
    pub fn page_request(&self, limit: Option<usize>, page: Option<i64>) -> PageRequest {
        PageRequest::from_signed(limit.or(Some(self.config.default_page_limit)), page)
    }

    /// RocksDB statistics dump.
    pub fn stats(&self) -> String {
        self.db.stats()
    }

    // =========================================================================
    // Shared record helpers
    // =========================================================================

    /// Loads a content record, `NotFound` when absent.
    pub(crate) fn load_record<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<T> {
        self.db
            .get(CF_CONTENT, &content_key(kind, id))?
            .ok_or_else(|| ForumError::not_found(format!("{}~{}", kind.prefix(), id)))
    }

    pub(crate) fn store_record<T: Serialize>(
        &self,
        kind: EntityKind,
        id: &str,
        record: &T,
    ) -> Result<()> {
        self.db.put(CF_CONTENT, &content_key(kind, id), record)
    }

    /// Scans every content record of one type in id order.
    pub(crate) fn scan_records<T: DeserializeOwned>(&self, kind: EntityKind) -> Result<Vec<T>> {
        self.db
            .scan(CF_CONTENT, &type_range_start(kind), &type_range_end(kind), None)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    /// Resolves an old-system id to the new id, `NotFound` when unmapped.
    pub(crate) fn resolve_legacy(&self, kind: EntityKind, legacy_id: u64) -> Result<String> {
        let raw = self
            .db
            .get_raw(CF_LEGACY, &legacy_key(kind, legacy_id))?
            .ok_or_else(|| {
                ForumError::not_found(format!("legacy {} id {}", kind.prefix(), legacy_id))
            })?;
        String::from_utf8(raw)
            .map_err(|e| ForumError::serialization(format!("Invalid legacy mapping: {}", e)))
    }

    /// Fails with `ConstraintViolation` if `legacy_id` is already mapped.
    pub(crate) fn ensure_legacy_free(&self, kind: EntityKind, legacy_id: u64) -> Result<()> {
        if self.db.exists(CF_LEGACY, &legacy_key(kind, legacy_id))? {
            return Err(ForumError::constraint(format!(
                "legacy {} id {} is already imported",
                kind.prefix(),
                legacy_id
            )));
        }
        Ok(())
    }

    pub(crate) fn map_legacy(&self, kind: EntityKind, legacy_id: u64, id: &str) -> Result<()> {
        debug!(kind = kind.prefix(), legacy_id, id, "Writing legacy mapping");
        self.db
            .put_raw(CF_LEGACY, &legacy_key(kind, legacy_id), id.as_bytes())
    }

    pub(crate) fn unmap_legacy(&self, kind: EntityKind, legacy_id: u64) -> Result<()> {
        self.db.delete(CF_LEGACY, &legacy_key(kind, legacy_id))
    }
}
