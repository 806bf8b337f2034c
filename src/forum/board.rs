//! Board records and their read-side summary.
//!
//! A board is the unit of the forum hierarchy. Its content record holds the
//! user-facing fields and the adjacency list (`children_ids`); post and thread
//! counts live in the metadata space and are joined in at read time to form a
//! [`BoardSummary`].

use crate::error::{ForumError, Result};
use crate::forum::constants::{MAX_DESCRIPTION_SIZE, MAX_NAME_SIZE};
use crate::forum::counters::MetadataValue;
use crate::forum::types::{FieldUpdate, MetadataField};
use serde::{Deserialize, Serialize};

/// A stored board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    /// Direct children in attach order. `None` when the board has none.
    pub children_ids: Option<Vec<String>>,
    pub category_id: Option<u32>,
    pub created_at: u64,
    pub updated_at: u64,
    pub imported_at: Option<u64>,
    pub deleted: bool,
    /// Id in the system this board was imported from.
    pub legacy_id: Option<u64>,
}

impl Board {
    /// A bare record with no parent, children or category.
    pub fn new_record(id: String, name: String, created_at: u64) -> Self {
        Self {
            id,
            name,
            description: None,
            parent_id: None,
            children_ids: None,
            category_id: None,
            created_at,
            updated_at: created_at,
            imported_at: None,
            deleted: false,
            legacy_id: None,
        }
    }

    /// Direct children, empty when there are none.
    pub fn children(&self) -> &[String] {
        self.children_ids.as_deref().unwrap_or(&[])
    }

    /// Returns true if at least one child board is attached.
    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ForumError::invalid_input("Board name cannot be empty"));
    }
    if name.len() > MAX_NAME_SIZE {
        return Err(ForumError::invalid_input(format!(
            "Board name exceeds maximum size of {} bytes",
            MAX_NAME_SIZE
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.len() > MAX_DESCRIPTION_SIZE {
        return Err(ForumError::invalid_input(format!(
            "Board description exceeds maximum size of {} bytes",
            MAX_DESCRIPTION_SIZE
        )));
    }
    Ok(())
}

/// Input for creating or importing a board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBoard {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub category_id: Option<u32>,
}

impl NewBoard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_category(mut self, category_id: u32) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Checks name and description sizes.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// A partial board update.
///
/// Only supplied fields change. `children_ids` is not updatable; re-parenting
/// through `parent_id` moves the board between parents' child lists. The
/// deleted flag changes only through delete and undelete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardUpdate {
    pub name: Option<String>,
    pub description: FieldUpdate<String>,
    pub parent_id: FieldUpdate<String>,
    pub category_id: FieldUpdate<u32>,
}

impl BoardUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let FieldUpdate::Set(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Applies every non-hierarchy field to `board`. `parent_id` is left to the caller.
    pub(crate) fn apply_fields(&self, board: &mut Board) {
        if let Some(name) = &self.name {
            board.name = name.clone();
        }
        self.description.clone().apply(&mut board.description);
        self.category_id.clone().apply(&mut board.category_id);
    }
}

/// A board joined with its metadata and resolved children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSummary {
    pub board: Board,
    pub post_count: u64,
    pub thread_count: u64,
    pub total_post_count: u64,
    pub total_thread_count: u64,
    pub last_post_username: Option<String>,
    pub last_post_created_at: Option<u64>,
    pub last_thread_title: Option<String>,
    pub last_thread_id: Option<String>,
    pub children: Vec<BoardSummary>,
}

impl BoardSummary {
    /// A summary with every counter at zero.
    pub fn new(board: Board) -> Self {
        Self {
            board,
            post_count: 0,
            thread_count: 0,
            total_post_count: 0,
            total_thread_count: 0,
            last_post_username: None,
            last_post_created_at: None,
            last_thread_title: None,
            last_thread_id: None,
            children: Vec::new(),
        }
    }

    /// Merges one metadata value: counts add, text overwrites.
    pub fn apply_metadata(&mut self, field: MetadataField, value: MetadataValue) {
        match (field, value) {
            (MetadataField::PostCount, MetadataValue::Count(n)) => self.post_count += n,
            (MetadataField::ThreadCount, MetadataValue::Count(n)) => self.thread_count += n,
            (MetadataField::TotalPostCount, MetadataValue::Count(n)) => self.total_post_count += n,
            (MetadataField::TotalThreadCount, MetadataValue::Count(n)) => {
                self.total_thread_count += n
            }
            (MetadataField::LastPostCreatedAt, MetadataValue::Count(n)) => {
                self.last_post_created_at = Some(n)
            }
            (MetadataField::LastPostUsername, MetadataValue::Text(s)) => {
                self.last_post_username = Some(s)
            }
            (MetadataField::LastThreadTitle, MetadataValue::Text(s)) => {
                self.last_thread_title = Some(s)
            }
            (MetadataField::LastThreadId, MetadataValue::Text(s)) => self.last_thread_id = Some(s),
            _ => {}
        }
    }

    pub fn id(&self) -> &str {
        &self.board.id
    }
}

/// Metadata fields joined into a [`BoardSummary`].
pub const BOARD_SUMMARY_FIELDS: &[MetadataField] = &[
    MetadataField::PostCount,
    MetadataField::ThreadCount,
    MetadataField::TotalPostCount,
    MetadataField::TotalThreadCount,
    MetadataField::LastPostUsername,
    MetadataField::LastPostCreatedAt,
    MetadataField::LastThreadTitle,
    MetadataField::LastThreadId,
];
