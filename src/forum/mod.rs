//! Forum content storage: boards, threads and posts on an ordered key-value store.
//!
//! The store underneath offers point reads and writes, batches and ordered
//! range scans, nothing more. This module layers on top of it:
//!
//! - **Counters** ([`counters`]): locked increments and decrements of post,
//!   thread and view counts, with board totals rolled up the hierarchy
//! - **Hierarchy** ([`hierarchy`]): parent/child adjacency between boards
//! - **Listing indexes** ([`index`]): rank-ordered thread and post listings
//!   with page-based range scans
//! - **Lifecycle** (`ops`): create, import, update, soft-delete, undelete
//!   and purge for every entity, exposed on [`ForumStorage`]
//!
//! ## Hierarchy
//!
//! ```text
//! Board
//!   ├── Board (child, nested to any depth)
//!   └── Thread
//!         └── Post
//! ```
//!
//! Categories group top-level boards for display and are replaced wholesale.

mod board;
mod category;
pub mod config;
pub mod constants;
pub mod counters;
pub mod hierarchy;
pub mod id;
pub mod index;
pub mod keys;
pub mod locks;
mod ops;
mod post;
pub mod storage;
mod thread;
pub mod types;

pub use board::{Board, BoardSummary, BoardUpdate, NewBoard};
pub use category::{Category, NewCategory};
pub use config::ForumConfig;
pub use post::{NewPost, Post, PostUpdate};
pub use storage::ForumStorage;
pub use thread::{NewThread, PurgedThread, Thread, ThreadSummary};
pub use types::{FieldUpdate, LegacyImport, PageRequest};
