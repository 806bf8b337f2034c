//! Thread records.
//!
//! A thread record only carries its identity and lifecycle state. Title,
//! poster, counts and view totals are derived from metadata when the thread
//! is read.

use crate::forum::counters::MetadataValue;
use crate::forum::types::MetadataField;
use serde::{Deserialize, Serialize};

/// A stored thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    /// Owning board. Never changes after creation.
    pub board_id: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub imported_at: Option<u64>,
    pub deleted: bool,
    pub legacy_id: Option<u64>,
}

/// Input for creating or importing a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub board_id: String,
}

impl NewThread {
    pub fn new(board_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
        }
    }
}

/// A thread joined with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub thread: Thread,
    pub post_count: u64,
    pub view_count: u64,
    pub first_post_id: Option<String>,
    /// Title of the first post.
    pub title: Option<String>,
    /// Username of the first poster.
    pub username: Option<String>,
    pub last_post_username: Option<String>,
    pub last_post_created_at: Option<u64>,
}

impl ThreadSummary {
    pub fn new(thread: Thread) -> Self {
        Self {
            thread,
            post_count: 0,
            view_count: 0,
            first_post_id: None,
            title: None,
            username: None,
            last_post_username: None,
            last_post_created_at: None,
        }
    }

    /// Merges one metadata value: counts add, text overwrites.
    pub fn apply_metadata(&mut self, field: MetadataField, value: MetadataValue) {
        match (field, value) {
            (MetadataField::PostCount, MetadataValue::Count(n)) => self.post_count += n,
            (MetadataField::ViewCount, MetadataValue::Count(n)) => self.view_count += n,
            (MetadataField::LastPostCreatedAt, MetadataValue::Count(n)) => {
                self.last_post_created_at = Some(n)
            }
            (MetadataField::FirstPostId, MetadataValue::Text(s)) => self.first_post_id = Some(s),
            (MetadataField::Title, MetadataValue::Text(s)) => self.title = Some(s),
            (MetadataField::Username, MetadataValue::Text(s)) => self.username = Some(s),
            (MetadataField::LastPostUsername, MetadataValue::Text(s)) => {
                self.last_post_username = Some(s)
            }
            _ => {}
        }
    }

    pub fn id(&self) -> &str {
        &self.thread.id
    }
}

/// Metadata fields joined into a [`ThreadSummary`].
pub const THREAD_SUMMARY_FIELDS: &[MetadataField] = &[
    MetadataField::PostCount,
    MetadataField::ViewCount,
    MetadataField::FirstPostId,
    MetadataField::Title,
    MetadataField::Username,
    MetadataField::LastPostUsername,
    MetadataField::LastPostCreatedAt,
];

/// A purged thread as archived in the deleted space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgedThread {
    pub thread: Thread,
    /// View count at the time of the purge.
    pub view_count: u64,
}
