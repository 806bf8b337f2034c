//! Entity operations on [`ForumStorage`].
//!
//! Each submodule adds one entity type's lifecycle to `ForumStorage`:
//! create/import, read, update, soft-delete, undelete and purge.

mod boards;
mod categories;
mod posts;
mod threads;

use crate::error::Result;
use crate::forum::constants::CF_METADATA;
use crate::forum::keys::{metadata_key, EntityKind};
use crate::forum::storage::ForumStorage;
use crate::forum::types::MetadataField;
use crate::storage::BatchOp;

impl ForumStorage {
    /// Writes 0 to every numeric field in `fields`, in one batch.
    pub(crate) fn zero_counters(
        &self,
        kind: EntityKind,
        id: &str,
        fields: &[MetadataField],
    ) -> Result<()> {
        let ops: Vec<BatchOp> = fields
            .iter()
            .filter(|field| field.is_numeric())
            .map(|field| BatchOp::put(metadata_key(kind, id, *field), 0u64.to_be_bytes().to_vec()))
            .collect();
        self.db.batch(CF_METADATA, &ops)
    }

    /// Deletes every field in `fields`, in one batch.
    pub(crate) fn delete_metadata(
        &self,
        kind: EntityKind,
        id: &str,
        fields: &[MetadataField],
    ) -> Result<()> {
        let ops: Vec<BatchOp> = fields
            .iter()
            .map(|field| BatchOp::delete(metadata_key(kind, id, *field)))
            .collect();
        self.db.batch(CF_METADATA, &ops)
    }
}
