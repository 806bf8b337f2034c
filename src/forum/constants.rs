//! Shared constants for the forum key layout and limits.

// =============================================================================
// Key Spaces (one RocksDB column family each)
// =============================================================================

/// Live entity records: boards, threads, posts.
pub const CF_CONTENT: &str = "content";

/// Counters and denormalized fields keyed by entity id + suffix.
pub const CF_METADATA: &str = "metadata";

/// Rank-encoded listing indexes and categories.
pub const CF_INDEXES: &str = "indexes";

/// Old-system id -> new id mappings written by imports.
pub const CF_LEGACY: &str = "legacy";

/// Archive for purged records.
pub const CF_DELETED: &str = "deleted";

/// Every key space, in the order the column families are opened.
pub const KEY_SPACES: &[&str] = &[CF_CONTENT, CF_METADATA, CF_INDEXES, CF_LEGACY, CF_DELETED];

// =============================================================================
// Key Schema
// =============================================================================

/// Separator between key components.
pub const SEP: u8 = b'~';

/// Upper bound byte for range scans over a prefix.
pub const RANGE_END: u8 = 0xff;

pub const BOARD_PREFIX: &str = "board";
pub const THREAD_PREFIX: &str = "thread";
pub const POST_PREFIX: &str = "post";
pub const CATEGORY_PREFIX: &str = "category";

/// Literal component between the owner id and the rank in listing index keys.
pub const ORDER_SEGMENT: &str = "order";

// =============================================================================
// Limits
// =============================================================================

/// Default page size for listing queries.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest page a single listing query will return.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Upper bound on parent hops walked during counter propagation.
pub const MAX_HIERARCHY_DEPTH: usize = 64;

/// Maximum board name size (256 bytes).
pub const MAX_NAME_SIZE: usize = 256;

/// Maximum board description size (10KB).
pub const MAX_DESCRIPTION_SIZE: usize = 10 * 1024;

/// Maximum post body size (100KB).
pub const MAX_POST_BODY_SIZE: usize = 100 * 1024;
