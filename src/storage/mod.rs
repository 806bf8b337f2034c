//! Ordered key-value store abstraction.
//!
//! ## Modules
//!
//! - `rocksdb`: RocksDB-backed handle (configuration, point ops, batches, range scans)

pub mod rocksdb;

pub use rocksdb::{decode, encode, BatchOp, RocksDbConfig, RocksDbHandle};
