//! # forumstore
//!
//! Persistent storage for a hierarchical forum (boards, threads, posts) on
//! RocksDB. The database only offers get/put/delete, batches and ordered
//! range scans; this crate builds the rest on top of it:
//!
//! - **Counters**: post/thread/view counts kept under process-wide locks,
//!   with board totals rolled up through parent boards
//! - **Listing indexes**: rank-encoded keys for paginated thread and post
//!   listings in creation order
//! - **Hierarchy**: nested boards with consistent parent/child links
//! - **Lifecycle**: soft-delete, undelete and purge into an archive space
//! - **Import**: old-system ids mapped to new ids for migrations
//!
//! ## Example
//!
//! ```rust,no_run
//! use forumstore::forum::{ForumStorage, NewBoard, NewPost, NewThread, PageRequest};
//! # fn main() -> forumstore::Result<()> {
//! let storage = ForumStorage::new("forum_data")?;
//!
//! let board = storage.create_board(NewBoard::new("General"))?;
//! let thread = storage.create_thread(NewThread::new(&board.id))?;
//! storage.create_post(NewPost::new(&thread.id, "Hello", "First post", "user-1"))?;
//!
//! for summary in storage.threads_by_board(&board.id, PageRequest::default())? {
//!     println!("{:?} ({} posts)", summary.title, summary.post_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod forum;
pub mod storage;

pub use error::{ForumError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
