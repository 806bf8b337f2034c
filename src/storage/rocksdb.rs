//! Ordered key-value store on top of RocksDB.
//!
//! Each logical key space is a column family. The handle exposes exactly the
//! primitive operations the forum layer builds on:
//!
//! - point `get` / `put` / `delete`
//! - ordered `batch` writes (put/delete in one `WriteBatch`)
//! - batched `multi_get` for independent fan-out reads
//! - ascending range `scan` between two keys with an optional limit
//!
//! There are no transactions here; anything built on top must do its own
//! locking for read-modify-write cycles.

use crate::error::{ForumError, Result};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
    WriteBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// =============================================================================
// RocksDB Configuration
// =============================================================================

/// Configuration for RocksDB storage.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    pub max_write_buffer_number: i32,
    /// Target file size for SST files.
    pub target_file_size_base: u64,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 32 * 1024 * 1024,      // 32MB
            write_buffer_size: 16 * 1024 * 1024, // 16MB
            max_write_buffer_number: 2,
            target_file_size_base: 32 * 1024 * 1024, // 32MB
        }
    }
}

impl RocksDbConfig {
    /// Creates a configuration for a long-running forum server.
    ///
    /// Uses larger buffers and more files for higher throughput.
    pub fn for_server() -> Self {
        Self {
            max_open_files: 512,
            keep_log_file_num: 3,
            max_wal_size: 64 * 1024 * 1024,      // 64MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
            target_file_size_base: 64 * 1024 * 1024, // 64MB
        }
    }

    /// Builds RocksDB Options from this configuration.
    pub fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_target_file_size_base(self.target_file_size_base);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

// =============================================================================
// Batched writes
// =============================================================================

/// A single write inside a [`RocksDbHandle::batch`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Store `value` at `key`.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove `key` (no-op if absent).
    Delete { key: Vec<u8> },
}

impl BatchOp {
    /// Creates a put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Self::Delete { key: key.into() }
    }
}

// =============================================================================
// Database Handle Wrapper
// =============================================================================

/// A cloneable handle to a RocksDB instance with one column family per key space.
#[derive(Clone)]
pub struct RocksDbHandle {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksDbHandle {
    /// Opens a RocksDB database with the given column families.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: &RocksDbConfig,
        column_families: &[&str],
    ) -> Result<Self> {
        let opts = config.build_options();
        let cf_opts = Options::default();

        let cf_descriptors: Vec<_> = column_families
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, cf_opts.clone()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            db_path.as_ref(),
            cf_descriptors,
        )
        .map_err(|e| ForumError::storage(format!("Failed to open RocksDB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Gets a column family handle.
    pub fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| ForumError::storage(format!("Column family '{}' not found", name)))
    }

    /// Serializes and stores a value at the given key.
    pub fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = encode(value)?;
        self.put_raw(cf_name, key, &bytes)
    }

    /// Stores raw bytes at the given key.
    pub fn put_raw(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            value_bytes = value.len(),
            "db_put: storing value"
        );

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| ForumError::storage(format!("Failed to write: {}", e)))
    }

    /// Loads and deserializes a value from the given key.
    pub fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        match self.get_raw(cf_name, key)? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Loads raw bytes from the given key.
    pub fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;

        match self.db.get_cf(&cf, key) {
            Ok(Some(bytes)) => {
                trace!(
                    cf = cf_name,
                    key_len = key.len(),
                    value_bytes = bytes.len(),
                    "db_get: found record"
                );
                Ok(Some(bytes))
            }
            Ok(None) => {
                trace!(cf = cf_name, key_len = key.len(), "db_get: key not found");
                Ok(None)
            }
            Err(e) => Err(ForumError::storage(format!("Failed to read: {}", e))),
        }
    }

    /// Loads several keys from one column family in a single batched read.
    ///
    /// The result has one entry per requested key, in request order.
    pub fn multi_get_raw(&self, cf_name: &str, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>> {
        let cf = self.cf(cf_name)?;

        let results = self
            .db
            .multi_get_cf(keys.iter().map(|key| (&cf, key.as_slice())));

        let mut values = Vec::with_capacity(results.len());
        for result in results {
            let value =
                result.map_err(|e| ForumError::storage(format!("Failed to read: {}", e)))?;
            values.push(value);
        }

        trace!(
            cf = cf_name,
            keys = keys.len(),
            found = values.iter().filter(|v| v.is_some()).count(),
            "db_multi_get: completed batched read"
        );

        Ok(values)
    }

    /// Checks if a key exists.
    pub fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        Ok(self.get_raw(cf_name, key)?.is_some())
    }

    /// Deletes a key. Deleting a missing key is not an error.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;

        trace!(cf = cf_name, key_len = key.len(), "db_delete: deleting key");

        self.db
            .delete_cf(&cf, key)
            .map_err(|e| ForumError::storage(format!("Failed to delete: {}", e)))
    }

    /// Applies a list of writes to one column family, in order, in one `WriteBatch`.
    pub fn batch(&self, cf_name: &str, ops: &[BatchOp]) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let mut batch = WriteBatch::default();

        for op in ops {
            match op {
                BatchOp::Put { key, value } => batch.put_cf(&cf, key, value),
                BatchOp::Delete { key } => batch.delete_cf(&cf, key),
            }
        }

        debug!(cf = cf_name, ops = ops.len(), "db_batch: applying writes");

        self.db
            .write(batch)
            .map_err(|e| ForumError::storage(format!("Failed to write batch: {}", e)))
    }

    /// Scans keys in ascending byte order from `start` (inclusive) to `end` (inclusive).
    ///
    /// Stops after `limit` entries when a limit is given.
    pub fn scan(
        &self,
        cf_name: &str,
        start: &[u8],
        end: &[u8],
        limit: Option<usize>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let mut iter = self.db.raw_iterator_cf(&cf);
        iter.seek(start);

        let mut entries = Vec::new();
        while iter.valid() {
            if limit.is_some_and(|limit| entries.len() >= limit) {
                break;
            }
            match (iter.key(), iter.value()) {
                (Some(key), Some(value)) => {
                    if key > end {
                        break;
                    }
                    entries.push((key.to_vec(), value.to_vec()));
                }
                _ => break,
            }
            iter.next();
        }

        if let Err(e) = iter.status() {
            warn!(cf = cf_name, "Iterator error: {}", e);
            return Err(ForumError::storage(format!("Failed to scan: {}", e)));
        }

        debug!(
            cf = cf_name,
            start_len = start.len(),
            end_len = end.len(),
            records_scanned = entries.len(),
            "db_scan: completed range scan"
        );

        Ok(entries)
    }

    /// Scans every key that starts with `prefix`.
    pub fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut end = prefix.to_vec();
        end.push(0xff);
        self.scan(cf_name, prefix, &end, None)
    }

    /// Returns database statistics.
    pub fn stats(&self) -> String {
        self.db
            .property_value("rocksdb.stats")
            .ok()
            .flatten()
            .unwrap_or_else(|| "Stats unavailable".to_string())
    }
}

impl std::fmt::Debug for RocksDbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbHandle")
            .field("db", &"RocksDB")
            .finish()
    }
}

/// Serializes a record with bincode.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| ForumError::serialization(format!("Failed to serialize: {}", e)))
}

/// Deserializes a bincode record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| ForumError::serialization(format!("Failed to deserialize: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: u64,
    }

    fn create_test_db() -> (RocksDbHandle, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test_db");
        let config = RocksDbConfig::default();
        let db =
            RocksDbHandle::open(&db_path, &config, &["data", "meta"]).expect("Failed to open db");
        (db, temp_dir)
    }

    #[test]
    fn test_put_and_get() {
        let (db, _temp) = create_test_db();

        let data = TestData {
            name: "Test".to_string(),
            value: 12345,
        };

        db.put("data", b"key1", &data).unwrap();

        let loaded: TestData = db.get("data", b"key1").unwrap().unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_column_families_are_separate() {
        let (db, _temp) = create_test_db();

        db.put_raw("data", b"key", b"in data").unwrap();
        assert!(db.exists("data", b"key").unwrap());
        assert!(!db.exists("meta", b"key").unwrap());
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let (db, _temp) = create_test_db();
        db.delete("meta", b"never-written").unwrap();
    }

    #[test]
    fn test_unknown_column_family() {
        let (db, _temp) = create_test_db();
        let err = db.get_raw("nope", b"key").unwrap_err();
        assert!(matches!(err, ForumError::Storage(_)));
    }

    #[test]
    fn test_batch_preserves_order() {
        let (db, _temp) = create_test_db();

        db.batch(
            "meta",
            &[
                BatchOp::put(b"a".to_vec(), b"1".to_vec()),
                BatchOp::put(b"b".to_vec(), b"2".to_vec()),
                BatchOp::delete(b"a".to_vec()),
            ],
        )
        .unwrap();

        assert!(!db.exists("meta", b"a").unwrap());
        assert_eq!(db.get_raw("meta", b"b").unwrap().unwrap(), b"2");
    }

    #[test]
    fn test_multi_get_keeps_request_order() {
        let (db, _temp) = create_test_db();

        db.put_raw("meta", b"x", b"1").unwrap();
        db.put_raw("meta", b"z", b"3").unwrap();

        let values = db
            .multi_get_raw("meta", &[b"z".to_vec(), b"y".to_vec(), b"x".to_vec()])
            .unwrap();
        assert_eq!(
            values,
            vec![Some(b"3".to_vec()), None, Some(b"1".to_vec())]
        );
    }

    #[test]
    fn test_scan_range_and_limit() {
        let (db, _temp) = create_test_db();

        for i in 0..10u8 {
            db.put_raw("data", &[b'k', b'~', b'0' + i], &[i]).unwrap();
        }
        db.put_raw("data", b"l~0", b"other").unwrap();

        let all = db.scan("data", b"k~", b"k~\xff", None).unwrap();
        assert_eq!(all.len(), 10);
        assert_eq!(all[0].0, b"k~0");
        assert_eq!(all[9].0, b"k~9");

        let page = db.scan("data", b"k~3", b"k~\xff", Some(4)).unwrap();
        let keys: Vec<_> = page.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![b"k~3".to_vec(), b"k~4".to_vec(), b"k~5".to_vec(), b"k~6".to_vec()]
        );
    }

    #[test]
    fn test_scan_prefix() {
        let (db, _temp) = create_test_db();

        db.put_raw("data", b"prefix1:a", b"data1").unwrap();
        db.put_raw("data", b"prefix1:b", b"data2").unwrap();
        db.put_raw("data", b"prefix2:a", b"data3").unwrap();

        let found = db.scan_prefix("data", b"prefix1:").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_server_config() {
        let config = RocksDbConfig::for_server();
        assert_eq!(config.max_open_files, 512);
        assert_eq!(config.max_wal_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_get_missing_key() {
        let (db, _temp) = create_test_db();
        let result: Option<TestData> = db.get("data", b"nonexistent").unwrap();
        assert!(result.is_none());
    }
}
