//! Shared types for forum storage.
//!
//! - `FieldUpdate`: three-state partial update for optional record fields
//! - `PageRequest`: limit/page pair for rank-indexed listings
//! - `MetadataField`: every counter and denormalized field kept in the metadata space

use crate::forum::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use std::fmt;

/// Returns the current time in milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A partial update to one field of a stored record.
///
/// `Keep` leaves the stored value untouched, `Set` overwrites it and
/// `Remove` drops an optional field entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Keep,
    Set(T),
    Remove,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> FieldUpdate<T> {
    /// Applies this update to an optional field.
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(value) => *slot = Some(value),
            FieldUpdate::Remove => *slot = None,
        }
    }
}

/// Old-system identifiers carried by an import.
///
/// `legacy_parent_id` names the old id of the owning entity: the parent board
/// of a board, the board of a thread, the thread of a post. When present it is
/// resolved through the legacy mapping and takes precedence over the new id
/// given on the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyImport {
    pub legacy_id: Option<u64>,
    pub legacy_parent_id: Option<u64>,
    /// Original creation time; the import time is used when absent.
    pub created_at: Option<u64>,
}

impl LegacyImport {
    /// Import of an entity known in the old system as `legacy_id`.
    pub fn new(legacy_id: u64) -> Self {
        Self {
            legacy_id: Some(legacy_id),
            ..Self::default()
        }
    }

    /// Sets the old id of the owning entity.
    pub fn with_parent(mut self, legacy_parent_id: u64) -> Self {
        self.legacy_parent_id = Some(legacy_parent_id);
        self
    }

    /// Sets the original creation time.
    pub fn created_at(mut self, created_at: u64) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Page selection for rank-indexed listings. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            page: 1,
        }
    }
}

impl PageRequest {
    /// Creates a page request; a zero limit falls back to the default and page 0 reads as page 1.
    pub fn new(limit: usize, page: usize) -> Self {
        let limit = match limit {
            0 => DEFAULT_PAGE_LIMIT,
            n => n.min(MAX_PAGE_LIMIT),
        };
        Self {
            limit,
            page: page.max(1),
        }
    }

    /// Builds a request from signed caller input, taking the absolute page number.
    pub fn from_signed(limit: Option<usize>, page: Option<i64>) -> Self {
        let page = page.map(|p| p.unsigned_abs() as usize).unwrap_or(1);
        Self::new(limit.unwrap_or(DEFAULT_PAGE_LIMIT), page)
    }

    /// First rank on this page: `limit * page - (limit - 1)`.
    pub fn first_rank(&self) -> u64 {
        let limit = self.limit.max(1) as u64;
        let page = self.page.max(1) as u64;
        limit.saturating_mul(page).saturating_sub(limit - 1)
    }
}

/// A value kept in the metadata key space next to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    /// Direct posts (boards and threads).
    PostCount,
    /// Direct threads (boards).
    ThreadCount,
    /// Posts in this board and all descendants.
    TotalPostCount,
    /// Threads in this board and all descendants.
    TotalThreadCount,
    /// Thread views.
    ViewCount,
    LastPostUsername,
    LastPostCreatedAt,
    LastThreadTitle,
    LastThreadId,
    /// Id of the first post of a thread.
    FirstPostId,
    /// Thread title, taken from its first post.
    Title,
    /// Username of the first poster.
    Username,
    /// Rank allocator for the board's thread index.
    ThreadOrder,
    /// Rank allocator for the thread's post index.
    PostOrder,
    /// Rank of this thread in its board's index.
    IndexRank,
}

impl MetadataField {
    /// Key suffix for this field.
    pub fn suffix(&self) -> &'static str {
        match self {
            MetadataField::PostCount => "post_count",
            MetadataField::ThreadCount => "thread_count",
            MetadataField::TotalPostCount => "total_post_count",
            MetadataField::TotalThreadCount => "total_thread_count",
            MetadataField::ViewCount => "view_count",
            MetadataField::LastPostUsername => "last_post_username",
            MetadataField::LastPostCreatedAt => "last_post_created_at",
            MetadataField::LastThreadTitle => "last_thread_title",
            MetadataField::LastThreadId => "last_thread_id",
            MetadataField::FirstPostId => "first_post_id",
            MetadataField::Title => "title",
            MetadataField::Username => "username",
            MetadataField::ThreadOrder => "thread_order",
            MetadataField::PostOrder => "post_order",
            MetadataField::IndexRank => "index_rank",
        }
    }

    /// Numeric fields are stored as big-endian u64, the rest as UTF-8 text.
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            MetadataField::LastPostUsername
                | MetadataField::LastThreadTitle
                | MetadataField::LastThreadId
                | MetadataField::FirstPostId
                | MetadataField::Title
                | MetadataField::Username
        )
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Every metadata field a board owns.
pub const BOARD_FIELDS: &[MetadataField] = &[
    MetadataField::PostCount,
    MetadataField::ThreadCount,
    MetadataField::TotalPostCount,
    MetadataField::TotalThreadCount,
    MetadataField::LastPostUsername,
    MetadataField::LastPostCreatedAt,
    MetadataField::LastThreadTitle,
    MetadataField::LastThreadId,
    MetadataField::ThreadOrder,
];

/// Every metadata field a thread owns.
pub const THREAD_FIELDS: &[MetadataField] = &[
    MetadataField::PostCount,
    MetadataField::ViewCount,
    MetadataField::FirstPostId,
    MetadataField::Title,
    MetadataField::Username,
    MetadataField::LastPostUsername,
    MetadataField::LastPostCreatedAt,
    MetadataField::PostOrder,
    MetadataField::IndexRank,
];
