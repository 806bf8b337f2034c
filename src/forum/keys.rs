//! Key schema for every entity, counter and index entry.
//!
//! Keys are `prefix ~ id [~ suffix]`. A scan from `prefix~` to `prefix~\xff`
//! enumerates exactly one entity type in id order, and metadata keys sort
//! right after the id they belong to without colliding with it.
//!
//! Listing indexes embed a rank as 16 lowercase hex digits of its big-endian
//! bytes, so byte order of the keys equals numeric order of the ranks.

use crate::forum::constants::{
    BOARD_PREFIX, CATEGORY_PREFIX, ORDER_SEGMENT, POST_PREFIX, RANGE_END, SEP, THREAD_PREFIX,
};
use crate::forum::types::MetadataField;

/// Entity kinds that own a key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Board,
    Thread,
    Post,
}

impl EntityKind {
    /// Key prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Board => BOARD_PREFIX,
            EntityKind::Thread => THREAD_PREFIX,
            EntityKind::Post => POST_PREFIX,
        }
    }
}

/// Joins key components with the separator.
fn join(parts: &[&str]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len() + 1).sum();
    let mut key = Vec::with_capacity(len);
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEP);
        }
        key.extend_from_slice(part.as_bytes());
    }
    key
}

/// Encodes a rank as fixed-width, order-preserving hex.
pub fn encode_rank(rank: u64) -> String {
    hex::encode(rank.to_be_bytes())
}

/// Decodes a rank written by [`encode_rank`].
pub fn decode_rank(encoded: &[u8]) -> Option<u64> {
    let bytes = hex::decode(encoded).ok()?;
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Content (and archive) key of an entity: `prefix~id`.
pub fn content_key(kind: EntityKind, id: &str) -> Vec<u8> {
    join(&[kind.prefix(), id])
}

/// Metadata key of one field of an entity: `prefix~id~suffix`.
pub fn metadata_key(kind: EntityKind, id: &str, field: MetadataField) -> Vec<u8> {
    join(&[kind.prefix(), id, field.suffix()])
}

/// Legacy mapping key: `prefix~old_id`.
pub fn legacy_key(kind: EntityKind, legacy_id: u64) -> Vec<u8> {
    join(&[kind.prefix(), &legacy_id.to_string()])
}

/// Start of the scan range covering every record of a type: `prefix~`.
pub fn type_range_start(kind: EntityKind) -> Vec<u8> {
    let mut key = kind.prefix().as_bytes().to_vec();
    key.push(SEP);
    key
}

/// End of the scan range covering every record of a type: `prefix~\xff`.
pub fn type_range_end(kind: EntityKind) -> Vec<u8> {
    let mut key = type_range_start(kind);
    key.push(RANGE_END);
    key
}

/// Prefix of a listing index owned by `owner_id`: `child_prefix~owner~order~`.
pub fn order_index_prefix(child: EntityKind, owner_id: &str) -> Vec<u8> {
    let mut key = join(&[child.prefix(), owner_id, ORDER_SEGMENT]);
    key.push(SEP);
    key
}

/// One entry of a listing index: `child_prefix~owner~order~{rank:016x}`.
pub fn order_index_key(child: EntityKind, owner_id: &str, rank: u64) -> Vec<u8> {
    let mut key = order_index_prefix(child, owner_id);
    key.extend_from_slice(encode_rank(rank).as_bytes());
    key
}

/// Index entry of a thread within its board.
pub fn board_thread_key(board_id: &str, rank: u64) -> Vec<u8> {
    order_index_key(EntityKind::Thread, board_id, rank)
}

/// Index entry of a post within its thread.
pub fn thread_post_key(thread_id: &str, rank: u64) -> Vec<u8> {
    order_index_key(EntityKind::Post, thread_id, rank)
}

/// Category record key: `category~{id:08x}`.
pub fn category_key(category_id: u32) -> Vec<u8> {
    join(&[CATEGORY_PREFIX, &format!("{:08x}", category_id)])
}

/// Scan range over all categories.
pub fn category_range() -> (Vec<u8>, Vec<u8>) {
    let mut start = CATEGORY_PREFIX.as_bytes().to_vec();
    start.push(SEP);
    let mut end = start.clone();
    end.push(RANGE_END);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_encoding_is_fixed_width_and_ordered() {
        let ranks = [0u64, 1, 9, 10, 15, 16, 255, 256, 4096, u64::MAX];
        let encoded: Vec<String> = ranks.iter().map(|r| encode_rank(*r)).collect();
        for e in &encoded {
            assert_eq!(e.len(), 16);
        }
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
        assert_eq!(decode_rank(encoded[4].as_bytes()), Some(15));
    }

    #[test]
    fn test_content_and_metadata_keys() {
        assert_eq!(content_key(EntityKind::Board, "abc"), b"board~abc");
        assert_eq!(
            metadata_key(EntityKind::Board, "abc", MetadataField::TotalPostCount),
            b"board~abc~total_post_count"
        );
        assert_eq!(legacy_key(EntityKind::Thread, 112), b"thread~112");
    }

    #[test]
    fn test_metadata_keys_sort_after_content_key() {
        let content = content_key(EntityKind::Board, "abc");
        let meta = metadata_key(EntityKind::Board, "abc", MetadataField::PostCount);
        let next = content_key(EntityKind::Board, "abd");
        assert!(content < meta);
        assert!(meta < next);
    }

    #[test]
    fn test_type_range_covers_only_its_prefix() {
        let start = type_range_start(EntityKind::Post);
        let end = type_range_end(EntityKind::Post);
        let post = content_key(EntityKind::Post, "0001");
        let thread = content_key(EntityKind::Thread, "0001");
        assert!(post >= start && post <= end);
        assert!(!(thread >= start && thread <= end));
    }

    #[test]
    fn test_index_keys() {
        let key = board_thread_key("b1", 11);
        assert_eq!(key, b"thread~b1~order~000000000000000b");
        assert!(key.starts_with(&order_index_prefix(EntityKind::Thread, "b1")));
        assert!(board_thread_key("b1", 2) < board_thread_key("b1", 10));
        assert_eq!(thread_post_key("t1", 1), b"post~t1~order~0000000000000001");
    }

    #[test]
    fn test_category_keys_sort_by_position() {
        assert_eq!(category_key(1), b"category~00000001");
        assert!(category_key(2) < category_key(10));
        let (start, end) = category_range();
        let key = category_key(7);
        assert!(key > start && key < end);
    }
}
