//! Post lifecycle and thread listings.

use crate::error::Result;
use crate::forum::board::Board;
use crate::forum::counters::MetadataValue;
use crate::forum::id::generate_id;
use crate::forum::index::ListingIndex;
use crate::forum::keys::{metadata_key, EntityKind};
use crate::forum::post::{NewPost, Post, PostUpdate};
use crate::forum::storage::ForumStorage;
use crate::forum::thread::Thread;
use crate::forum::types::{current_timestamp_millis, LegacyImport, MetadataField, PageRequest};
use tracing::{debug, warn};

impl ForumStorage {
    /// Creates a post in an existing thread.
    ///
    /// Updates the thread and board post counts (propagating board totals),
    /// the "last post" fields of both, the board's "last thread" fields, and
    /// the first-post fields when this is the thread's first post.
    pub fn create_post(&self, new: NewPost) -> Result<Post> {
        self.insert_post(new, current_timestamp_millis(), None, None)
    }

    /// Imports a post from the old system.
    ///
    /// A `legacy_parent_id` names the old thread id and replaces `thread_id`.
    pub fn import_post(&self, mut new: NewPost, legacy: LegacyImport) -> Result<Post> {
        if let Some(legacy_id) = legacy.legacy_id {
            self.ensure_legacy_free(EntityKind::Post, legacy_id)?;
        }
        if let Some(legacy_thread_id) = legacy.legacy_parent_id {
            new.thread_id = self.resolve_legacy(EntityKind::Thread, legacy_thread_id)?;
        }

        let now = current_timestamp_millis();
        let post = self.insert_post(
            new,
            legacy.created_at.unwrap_or(now),
            Some(now),
            legacy.legacy_id,
        )?;

        if let Some(legacy_id) = legacy.legacy_id {
            self.map_legacy(EntityKind::Post, legacy_id, &post.id)?;
        }
        Ok(post)
    }

    fn insert_post(
        &self,
        new: NewPost,
        created_at: u64,
        imported_at: Option<u64>,
        legacy_id: Option<u64>,
    ) -> Result<Post> {
        new.validate()?;
        let thread: Thread = self.load_record(EntityKind::Thread, &new.thread_id)?;
        self.load_record::<Board>(EntityKind::Board, &thread.board_id)?;

        let post = Post {
            id: generate_id(created_at),
            thread_id: new.thread_id,
            title: new.title,
            body: new.body,
            user_id: new.user_id,
            username: new.username,
            created_at,
            updated_at: created_at,
            imported_at,
            deleted: false,
            legacy_id,
        };
        self.store_record(EntityKind::Post, &post.id, &post)?;

        let thread_posts = self.counters.increment(
            &self.locks.post_count,
            &metadata_key(EntityKind::Thread, &thread.id, MetadataField::PostCount),
        )?;
        if thread_posts == 1 {
            self.record_first_post(&thread, &post)?;
        }
        self.inc_post_count(&thread.board_id)?;
        self.record_last_post(&thread, &post)?;

        let rank = self
            .index
            .append(ListingIndex::ThreadPosts, &thread.id, &post.id)?;

        debug!(post_id = %post.id, thread_id = %thread.id, rank, "Created post");
        Ok(post)
    }

    fn record_first_post(&self, thread: &Thread, post: &Post) -> Result<()> {
        let counters = &self.counters;
        counters.set_text(EntityKind::Thread, &thread.id, MetadataField::FirstPostId, &post.id)?;
        counters.set_text(EntityKind::Thread, &thread.id, MetadataField::Title, &post.title)?;
        if let Some(username) = &post.username {
            counters.set_text(EntityKind::Thread, &thread.id, MetadataField::Username, username)?;
        }
        Ok(())
    }

    fn record_last_post(&self, thread: &Thread, post: &Post) -> Result<()> {
        let counters = &self.counters;
        for (kind, id) in [
            (EntityKind::Thread, thread.id.as_str()),
            (EntityKind::Board, thread.board_id.as_str()),
        ] {
            counters.set_count(kind, id, MetadataField::LastPostCreatedAt, post.created_at)?;
            if let Some(username) = &post.username {
                counters.set_text(kind, id, MetadataField::LastPostUsername, username)?;
            }
        }

        let title = counters
            .load_fields(EntityKind::Thread, &thread.id, &[MetadataField::Title])?
            .into_iter()
            .find_map(|(_, value)| match value {
                Some(MetadataValue::Text(title)) => Some(title),
                _ => None,
            });
        if let Some(title) = title {
            counters.set_text(
                EntityKind::Board,
                &thread.board_id,
                MetadataField::LastThreadTitle,
                &title,
            )?;
        }
        counters.set_text(
            EntityKind::Board,
            &thread.board_id,
            MetadataField::LastThreadId,
            &thread.id,
        )
    }

    pub fn find_post(&self, id: &str) -> Result<Post> {
        self.load_record(EntityKind::Post, id)
    }

    /// Applies a partial update to title and body.
    pub fn update_post(&self, id: &str, update: PostUpdate) -> Result<Post> {
        update.validate()?;
        let mut post: Post = self.load_record(EntityKind::Post, id)?;
        update.apply(&mut post);
        post.updated_at = current_timestamp_millis();
        self.store_record(EntityKind::Post, id, &post)?;
        Ok(post)
    }

    fn set_post_deleted(&self, id: &str, deleted: bool) -> Result<Post> {
        let mut post: Post = self.load_record(EntityKind::Post, id)?;
        post.deleted = deleted;
        post.updated_at = current_timestamp_millis();
        self.store_record(EntityKind::Post, id, &post)?;
        Ok(post)
    }

    /// Soft-deletes a post. Counts are not changed.
    pub fn delete_post(&self, id: &str) -> Result<Post> {
        self.set_post_deleted(id, true)
    }

    pub fn undelete_post(&self, id: &str) -> Result<Post> {
        self.set_post_deleted(id, false)
    }

    pub fn post_by_old_id(&self, legacy_id: u64) -> Result<Post> {
        let id = self.resolve_legacy(EntityKind::Post, legacy_id)?;
        self.find_post(&id)
    }

    /// Every stored post in id order.
    pub fn all_posts(&self) -> Result<Vec<Post>> {
        self.scan_records(EntityKind::Post)
    }

    /// One page of a thread's posts in creation order.
    pub fn posts_by_thread(&self, thread_id: &str, page: PageRequest) -> Result<Vec<Post>> {
        let entries = self.index.page(ListingIndex::ThreadPosts, thread_id, page)?;

        let mut posts = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.find_post(&entry.id) {
                Ok(post) => posts.push(post),
                Err(e) if e.is_not_found() => {
                    warn!(
                        thread_id,
                        post_id = %entry.id,
                        rank = entry.rank,
                        "Stale post index entry"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::board::NewBoard;
    use crate::forum::constants::CF_METADATA;
    use crate::forum::thread::NewThread;
    use tempfile::TempDir;

    fn create_test_storage() -> (ForumStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = ForumStorage::new(temp_dir.path()).expect("Failed to create storage");
        (storage, temp_dir)
    }

    fn create_thread(storage: &ForumStorage) -> Thread {
        let board = storage.create_board(NewBoard::new("Board")).unwrap();
        storage.create_thread(NewThread::new(&board.id)).unwrap()
    }

    #[test]
    fn test_create_post_requires_thread() {
        let (storage, _temp) = create_test_storage();
        let err = storage
            .create_post(NewPost::new("missing", "Hi", "body", "u1"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_create_post_in_thread_of_purged_board() {
        let (storage, _temp) = create_test_storage();
        let thread = create_thread(&storage);
        storage.purge_board(&thread.board_id).unwrap();

        let err = storage
            .create_post(NewPost::new(&thread.id, "Hi", "body", "u1"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(storage.all_posts().unwrap().is_empty());

        let board_prefix = format!("board~{}~", thread.board_id);
        assert!(storage
            .db
            .scan_prefix(CF_METADATA, board_prefix.as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_first_post_sets_thread_fields() {
        let (storage, _temp) = create_test_storage();
        let thread = create_thread(&storage);

        let first = storage
            .create_post(NewPost::new(&thread.id, "Welcome", "first!", "u1").with_username("ann"))
            .unwrap();
        let second = storage
            .create_post(
                NewPost::new(&thread.id, "Re: Welcome", "second", "u2").with_username("bob"),
            )
            .unwrap();

        let summary = storage.find_thread(&thread.id).unwrap();
        assert_eq!(summary.post_count, 2);
        assert_eq!(summary.first_post_id.as_deref(), Some(first.id.as_str()));
        assert_eq!(summary.title.as_deref(), Some("Welcome"));
        assert_eq!(summary.username.as_deref(), Some("ann"));
        assert_eq!(summary.last_post_username.as_deref(), Some("bob"));
        assert_eq!(summary.last_post_created_at, Some(second.created_at));
    }

    #[test]
    fn test_post_updates_board_fields() {
        let (storage, _temp) = create_test_storage();
        let thread = create_thread(&storage);

        storage
            .create_post(NewPost::new(&thread.id, "Topic", "text", "u1").with_username("cat"))
            .unwrap();

        let board = storage.find_board(&thread.board_id).unwrap();
        assert_eq!(board.post_count, 1);
        assert_eq!(board.total_post_count, 1);
        assert_eq!(board.last_post_username.as_deref(), Some("cat"));
        assert_eq!(board.last_thread_title.as_deref(), Some("Topic"));
        assert_eq!(board.last_thread_id.as_deref(), Some(thread.id.as_str()));
    }

    #[test]
    fn test_update_and_soft_delete() {
        let (storage, _temp) = create_test_storage();
        let thread = create_thread(&storage);
        let post = storage
            .create_post(NewPost::new(&thread.id, "Title", "Body", "u1"))
            .unwrap();

        let updated = storage
            .update_post(
                &post.id,
                PostUpdate {
                    body: Some("Edited".into()),
                    ..PostUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Title");
        assert_eq!(updated.body, "Edited");

        assert!(storage.delete_post(&post.id).unwrap().deleted);
        assert!(storage.find_post(&post.id).unwrap().deleted);
        assert!(!storage.undelete_post(&post.id).unwrap().deleted);
        assert!(storage.update_post("missing", PostUpdate::default()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_posts_by_thread_pages() {
        let (storage, _temp) = create_test_storage();
        let thread = create_thread(&storage);
        let ids: Vec<String> = (1..=7)
            .map(|i| {
                storage
                    .create_post(NewPost::new(&thread.id, format!("p{}", i), "b", "u"))
                    .unwrap()
                    .id
            })
            .collect();

        let page = storage
            .posts_by_thread(&thread.id, PageRequest::new(3, 2))
            .unwrap();
        let got: Vec<String> = page.into_iter().map(|p| p.id).collect();
        assert_eq!(got, ids[3..6].to_vec());

        let all = storage.all_posts().unwrap();
        assert_eq!(all.len(), 7);
    }

    #[test]
    fn test_import_post_by_legacy_thread() {
        let (storage, _temp) = create_test_storage();
        let board = storage.create_board(NewBoard::new("Board")).unwrap();
        let thread = storage
            .import_thread(NewThread::new(&board.id), LegacyImport::new(77))
            .unwrap();

        let post = storage
            .import_post(
                NewPost::new("", "Old post", "body", "u9"),
                LegacyImport::new(700).with_parent(77),
            )
            .unwrap();
        assert_eq!(post.thread_id, thread.id);
        assert!(post.imported_at.is_some());
        assert_eq!(storage.post_by_old_id(700).unwrap().id, post.id);
        assert!(storage.post_by_old_id(701).unwrap_err().is_not_found());
    }
}
