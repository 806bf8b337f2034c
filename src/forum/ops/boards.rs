//! Board lifecycle and board counters.

use crate::error::{ForumError, Result};
use crate::forum::board::{Board, BoardSummary, BoardUpdate, NewBoard, BOARD_SUMMARY_FIELDS};
use crate::forum::constants::{CF_CONTENT, CF_DELETED};
use crate::forum::counters::{BoardCounter, Direction};
use crate::forum::id::generate_id;
use crate::forum::index::ListingIndex;
use crate::forum::keys::{content_key, EntityKind};
use crate::forum::storage::ForumStorage;
use crate::forum::types::{
    current_timestamp_millis, FieldUpdate, LegacyImport, MetadataField, BOARD_FIELDS,
};
use tracing::{debug, info, warn};

/// Counters a new board starts with.
const BOARD_COUNTERS: &[MetadataField] = &[
    MetadataField::PostCount,
    MetadataField::ThreadCount,
    MetadataField::TotalPostCount,
    MetadataField::TotalThreadCount,
];

impl ForumStorage {
    // =========================================================================
    // Create / import
    // =========================================================================

    /// Creates a board and attaches it to its parent.
    ///
    /// Fails with `NotFound` if `parent_id` names no board.
    pub fn create_board(&self, new: NewBoard) -> Result<Board> {
        self.insert_board(new, current_timestamp_millis(), None, None)
    }

    /// Imports a board from the old system.
    ///
    /// A `legacy_parent_id` is resolved through the legacy mapping and
    /// replaces `parent_id`. The legacy id must not be mapped yet.
    pub fn import_board(&self, mut new: NewBoard, legacy: LegacyImport) -> Result<Board> {
        if let Some(legacy_id) = legacy.legacy_id {
            self.ensure_legacy_free(EntityKind::Board, legacy_id)?;
        }
        if let Some(legacy_parent_id) = legacy.legacy_parent_id {
            new.parent_id = Some(self.resolve_legacy(EntityKind::Board, legacy_parent_id)?);
        }

        let now = current_timestamp_millis();
        let board = self.insert_board(
            new,
            legacy.created_at.unwrap_or(now),
            Some(now),
            legacy.legacy_id,
        )?;

        if let Some(legacy_id) = legacy.legacy_id {
            self.map_legacy(EntityKind::Board, legacy_id, &board.id)?;
        }
        Ok(board)
    }

    fn insert_board(
        &self,
        new: NewBoard,
        created_at: u64,
        imported_at: Option<u64>,
        legacy_id: Option<u64>,
    ) -> Result<Board> {
        new.validate()?;
        // One parent-update guard spans the parent check and the attach.
        let _guard = new
            .parent_id
            .as_ref()
            .map(|_| self.locks.parent_update.acquire());
        if let Some(parent_id) = &new.parent_id {
            self.load_record::<Board>(EntityKind::Board, parent_id)?;
        }

        let board = Board {
            id: generate_id(created_at),
            name: new.name,
            description: new.description,
            parent_id: new.parent_id,
            children_ids: None,
            category_id: new.category_id,
            created_at,
            updated_at: created_at,
            imported_at,
            deleted: false,
            legacy_id,
        };

        self.store_record(EntityKind::Board, &board.id, &board)?;
        self.zero_counters(EntityKind::Board, &board.id, BOARD_COUNTERS)?;
        if let Some(parent_id) = &board.parent_id {
            self.hierarchy.attach(&board.id, parent_id)?;
        }

        debug!(board_id = %board.id, parent_id = ?board.parent_id, "Created board");
        Ok(board)
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Reads a board joined with its metadata and its resolved children.
    pub fn find_board(&self, id: &str) -> Result<BoardSummary> {
        let board: Board = self.load_record(EntityKind::Board, id)?;
        self.summarize_board(board, &mut Vec::new())
    }

    /// Joins a board with its metadata and recursively with its children.
    ///
    /// `path` holds the boards above this one; a child already on the path or
    /// beyond the configured depth is skipped.
    fn summarize_board(&self, board: Board, path: &mut Vec<String>) -> Result<BoardSummary> {
        let fields = self
            .counters
            .load_fields(EntityKind::Board, &board.id, BOARD_SUMMARY_FIELDS)?;
        let children_ids = board.children().to_vec();
        let mut summary = BoardSummary::new(board);
        for (field, value) in fields {
            if let Some(value) = value {
                summary.apply_metadata(field, value);
            }
        }

        path.push(summary.board.id.clone());
        for child_id in children_ids {
            if path.contains(&child_id) || path.len() >= self.config.max_hierarchy_depth {
                warn!(
                    board_id = %summary.board.id,
                    child_id = %child_id,
                    "Skipping child already on the path or beyond maximum depth"
                );
                continue;
            }
            match self.load_record::<Board>(EntityKind::Board, &child_id) {
                Ok(child) => summary.children.push(self.summarize_board(child, path)?),
                Err(e) if e.is_not_found() => {
                    warn!(
                        board_id = %summary.board.id,
                        child_id = %child_id,
                        "Child board missing"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        path.pop();

        Ok(summary)
    }

    /// Looks a board up by its old-system id.
    pub fn board_by_old_id(&self, legacy_id: u64) -> Result<BoardSummary> {
        let id = self.resolve_legacy(EntityKind::Board, legacy_id)?;
        self.find_board(&id)
    }

    /// Every top-level board, with children nested.
    pub fn all_boards(&self) -> Result<Vec<BoardSummary>> {
        let boards: Vec<Board> = self.scan_records(EntityKind::Board)?;
        boards
            .into_iter()
            .filter(|board| board.parent_id.is_none())
            .map(|board| self.summarize_board(board, &mut Vec::new()))
            .collect()
    }

    // =========================================================================
    // Update / delete
    // =========================================================================

    /// Read-modify-write of one board record under the parent-update lock.
    pub(crate) fn rewrite_board<F>(&self, id: &str, edit: F) -> Result<(Board, Board)>
    where
        F: FnOnce(&mut Board) -> Result<()>,
    {
        let _guard = self.locks.parent_update.acquire();
        let before: Board = self.load_record(EntityKind::Board, id)?;
        let mut after = before.clone();
        edit(&mut after)?;
        after.updated_at = current_timestamp_millis();
        self.store_record(EntityKind::Board, id, &after)?;
        Ok((before, after))
    }

    /// Applies a partial update.
    ///
    /// Changing `parent_id` moves the board from the old parent's children to
    /// the new parent's. Counter totals already propagated to the old
    /// ancestors are not moved.
    pub fn update_board(&self, id: &str, update: BoardUpdate) -> Result<Board> {
        update.validate()?;
        if let FieldUpdate::Set(parent_id) = &update.parent_id {
            self.check_new_parent(id, parent_id)?;
        }

        let (before, after) = self.rewrite_board(id, |board| {
            update.apply_fields(board);
            update.parent_id.clone().apply(&mut board.parent_id);
            Ok(())
        })?;

        if before.parent_id != after.parent_id {
            if let Some(old_parent) = &before.parent_id {
                self.hierarchy.remove_child(id, old_parent)?;
            }
            if let Some(new_parent) = &after.parent_id {
                self.hierarchy.add_child(id, new_parent)?;
            }
        }

        debug!(board_id = id, "Updated board");
        Ok(after)
    }

    /// Rejects a parent that does not exist, is the board itself or lies below it.
    fn check_new_parent(&self, id: &str, parent_id: &str) -> Result<()> {
        if parent_id == id {
            return Err(ForumError::invalid_input("A board cannot be its own parent"));
        }

        let mut current: Board = self.load_record(EntityKind::Board, parent_id)?;
        for _ in 0..self.config.max_hierarchy_depth {
            match current.parent_id.as_deref() {
                Some(ancestor) if ancestor == id => {
                    return Err(ForumError::invalid_input(format!(
                        "Board {} is an ancestor of {}",
                        id, parent_id
                    )));
                }
                Some(ancestor) => match self.load_record::<Board>(EntityKind::Board, ancestor) {
                    Ok(board) => current = board,
                    Err(e) if e.is_not_found() => return Ok(()),
                    Err(e) => return Err(e),
                },
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Soft-deletes a board. Fails with `PreconditionFailed` while it has children.
    pub fn delete_board(&self, id: &str) -> Result<Board> {
        let (_, board) = self.rewrite_board(id, |board| {
            if board.has_children() {
                return Err(ForumError::precondition(
                    "Cannot delete parent board with child boards",
                ));
            }
            board.deleted = true;
            Ok(())
        })?;
        debug!(board_id = id, "Soft-deleted board");
        Ok(board)
    }

    /// Clears the deleted flag.
    pub fn undelete_board(&self, id: &str) -> Result<Board> {
        let (_, board) = self.rewrite_board(id, |board| {
            board.deleted = false;
            Ok(())
        })?;
        Ok(board)
    }

    /// Permanently removes a board, archiving its record.
    ///
    /// Fails with `PreconditionFailed` while it has children. Runs under the
    /// category lock and then the parent-update lock, so no child can be
    /// attached between the check and the removal. Steps run in order and
    /// each is safe to repeat; the record leaves `content` last.
    pub fn purge_board(&self, id: &str) -> Result<Board> {
        let _category_guard = self.locks.category.acquire();
        let _parent_guard = self.locks.parent_update.acquire();

        let mut board: Board = self.load_record(EntityKind::Board, id)?;
        if board.has_children() {
            return Err(ForumError::precondition(
                "Cannot purge parent board with child boards",
            ));
        }

        if let Some(parent_id) = &board.parent_id {
            self.hierarchy.detach(id, parent_id)?;
        }
        self.index.clear(ListingIndex::BoardThreads, id)?;
        self.delete_metadata(EntityKind::Board, id, BOARD_FIELDS)?;
        if let Some(legacy_id) = board.legacy_id {
            self.unmap_legacy(EntityKind::Board, legacy_id)?;
        }
        if board.category_id.is_some() {
            self.remove_from_category(&board)?;
            board.category_id = None;
        }

        let key = content_key(EntityKind::Board, id);
        self.db.put(CF_DELETED, &key, &board)?;
        self.db.delete(CF_CONTENT, &key)?;

        info!(board_id = id, "Purged board");
        Ok(board)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Adds one post to a board and its ancestors' totals. Returns the board's count.
    pub fn inc_post_count(&self, board_id: &str) -> Result<u64> {
        self.counters
            .change_board_count(board_id, BoardCounter::Posts, Direction::Increment)
    }

    /// Removes one post from a board and walks the totals up while they stay above 0.
    pub fn dec_post_count(&self, board_id: &str) -> Result<u64> {
        self.counters
            .change_board_count(board_id, BoardCounter::Posts, Direction::Decrement)
    }

    pub fn inc_thread_count(&self, board_id: &str) -> Result<u64> {
        self.counters
            .change_board_count(board_id, BoardCounter::Threads, Direction::Increment)
    }

    pub fn dec_thread_count(&self, board_id: &str) -> Result<u64> {
        self.counters
            .change_board_count(board_id, BoardCounter::Threads, Direction::Decrement)
    }
}
