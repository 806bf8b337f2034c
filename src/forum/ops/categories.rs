//! Category reassignment.
//!
//! Categories are replaced wholesale: a reorder deletes every stored category,
//! clears `category_id` on their boards, then writes the new list with ids
//! 1..=n and points each listed board at its new id. All of it runs under the
//! category lock; board records themselves are rewritten under the
//! parent-update lock, which is always taken second.

use crate::error::{ForumError, Result};
use crate::forum::board::Board;
use crate::forum::category::{Category, NewCategory};
use crate::forum::constants::CF_INDEXES;
use crate::forum::keys::{category_key, category_range};
use crate::forum::storage::ForumStorage;
use crate::forum::types::FieldUpdate;
use crate::storage::decode;
use tracing::{debug, info, warn};

impl ForumStorage {
    /// Stored categories in id order.
    pub fn all_categories(&self) -> Result<Vec<Category>> {
        let (start, end) = category_range();
        self.db
            .scan(CF_INDEXES, &start, &end, None)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    /// Replaces every category with `categories`, in order.
    ///
    /// Boards that no longer exist are skipped.
    pub fn update_categories(&self, categories: Vec<NewCategory>) -> Result<Vec<Category>> {
        let _guard = self.locks.category.acquire();

        for old in self.all_categories()? {
            self.db.delete(CF_INDEXES, &category_key(old.id))?;
            for board_id in &old.board_ids {
                self.assign_category(board_id, FieldUpdate::Remove)?;
            }
        }

        let mut stored = Vec::with_capacity(categories.len());
        for (position, new) in categories.into_iter().enumerate() {
            let category = Category {
                id: position as u32 + 1,
                name: new.name,
                board_ids: new.board_ids,
            };
            self.db.put(CF_INDEXES, &category_key(category.id), &category)?;
            for board_id in &category.board_ids {
                self.assign_category(board_id, FieldUpdate::Set(category.id))?;
            }
            stored.push(category);
        }

        info!(categories = stored.len(), "Replaced categories");
        Ok(stored)
    }

    fn assign_category(&self, board_id: &str, category_id: FieldUpdate<u32>) -> Result<()> {
        match self.rewrite_board(board_id, |board| {
            category_id.apply(&mut board.category_id);
            Ok(())
        }) {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(board_id, "Category lists a missing board");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a board from the category its `category_id` points at.
    ///
    /// Fails with `PreconditionFailed` if the board has no category. A missing
    /// category record is a no-op and returns `None`.
    pub fn category_delete_board(&self, board: &Board) -> Result<Option<Category>> {
        let _guard = self.locks.category.acquire();
        self.remove_from_category(board)
    }

    /// Unlocked [`category_delete_board`](Self::category_delete_board); the
    /// caller holds the category lock.
    pub(crate) fn remove_from_category(&self, board: &Board) -> Result<Option<Category>> {
        let category_id = board.category_id.ok_or_else(|| {
            ForumError::precondition("Board must have a category_id to be removed from a category")
        })?;
        let key = category_key(category_id);

        let Some(mut category) = self.db.get::<Category>(CF_INDEXES, &key)? else {
            debug!(board_id = %board.id, category_id, "Category already gone");
            return Ok(None);
        };
        category.board_ids.retain(|id| id != &board.id);
        self.db.put(CF_INDEXES, &key, &category)?;

        debug!(board_id = %board.id, category_id, "Removed board from category");
        Ok(Some(category))
    }
}
