//! Category records.
//!
//! A category groups boards under a name. Its id is its 1-based position in
//! the last reorder and is reassigned on every reorder.

use serde::{Deserialize, Serialize};

/// A stored category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub name: String,
    /// Member boards in display order.
    pub board_ids: Vec<String>,
}

/// One entry of a category reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub board_ids: Vec<String>,
}

impl NewCategory {
    pub fn new<I, S>(name: impl Into<String>, board_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            board_ids: board_ids.into_iter().map(Into::into).collect(),
        }
    }
}
