//! Store configuration.

use crate::forum::constants::{DEFAULT_PAGE_LIMIT, MAX_HIERARCHY_DEPTH};
use crate::storage::RocksDbConfig;
use std::path::PathBuf;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "forum_data";

/// Configuration for opening a [`ForumStorage`](crate::forum::ForumStorage).
#[derive(Debug, Clone)]
pub struct ForumConfig {
    /// Directory holding the RocksDB files.
    pub data_dir: PathBuf,
    /// RocksDB tuning.
    pub rocksdb: RocksDbConfig,
    /// Page size used when a listing request gives none.
    pub default_page_limit: usize,
    /// Upper bound on parent hops during counter propagation.
    pub max_hierarchy_depth: usize,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            rocksdb: RocksDbConfig::default(),
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_hierarchy_depth: MAX_HIERARCHY_DEPTH,
        }
    }
}

impl ForumConfig {
    /// Default settings with the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Settings for a long-running server process.
    pub fn for_server(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            rocksdb: RocksDbConfig::for_server(),
            ..Self::default()
        }
    }

    pub fn with_max_hierarchy_depth(mut self, depth: usize) -> Self {
        self.max_hierarchy_depth = depth;
        self
    }

    pub fn with_default_page_limit(mut self, limit: usize) -> Self {
        self.default_page_limit = limit;
        self
    }
}
