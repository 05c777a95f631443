//! # Persistent Storage
//!
//! Disk-backed implementations of the params and blacklist ports. Enabled
//! with the `rocksdb` feature; without it the in-memory adapters of each
//! crate are the only stores.

use thiserror::Error;

#[cfg(feature = "rocksdb")]
mod rocksdb_store;

#[cfg(feature = "rocksdb")]
pub use rocksdb_store::{RocksDbConfig, RocksDbStore, COLUMN_FAMILIES};

/// Storage backend failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database could not be opened.
    #[error("failed to open store at {path}: {reason}")]
    Open {
        /// Database directory.
        path: String,
        /// Backend message.
        reason: String,
    },

    /// A column family is missing from an open database.
    #[error("missing column family {0}")]
    MissingColumnFamily(&'static str),

    /// Read or write failed.
    #[error("storage io error: {0}")]
    Io(String),

    /// Stored bytes could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Key of a per-height snapshot. Big-endian so keys sort by height.
pub fn height_key(height: u64) -> [u8; 8] {
    height.to_be_bytes()
}
