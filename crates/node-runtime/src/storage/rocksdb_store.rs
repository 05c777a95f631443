//! # RocksDB Store
//!
//! One database, three column families:
//!
//! - `params` - instruction pipeline params, string keys
//! - `blacklist` - blacklist snapshot per beacon height (JSON)
//! - `producers` - live punishment record per validator
//!
//! Every batch goes through a single `WriteBatch`, so a block's writes land
//! together or not at all.

use super::{height_key, StorageError};
use bc_02_slashing::{BlacklistBatch, BlacklistStore, SlashingError};
use bc_03_instructions::{ParamsBatch, ParamsStore, StoreError};
use parking_lot::RwLock;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamilyDescriptor, DBCompressionType, Options, WriteBatch,
    WriteOptions, DB,
};
use shared_types::{BeaconHeight, Blacklist};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Stability params by key.
pub const CF_PARAMS: &str = "params";
/// Blacklist snapshots by height.
pub const CF_BLACKLIST: &str = "blacklist";
/// Live punishment record per producer.
pub const CF_PRODUCERS: &str = "producers";

/// All column families opened by [`RocksDbStore`].
pub const COLUMN_FAMILIES: &[&str] = &[CF_PARAMS, CF_BLACKLIST, CF_PRODUCERS];

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 32MB).
    pub write_buffer_size: usize,
    /// fsync every batch.
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/rocksdb"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 32 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 2 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// Params and blacklist storage in one RocksDB instance.
pub struct RocksDbStore {
    db: Arc<RwLock<DB>>,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create the database.
    pub fn open(config: RocksDbConfig) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, descriptors).map_err(|e| {
            StorageError::Open {
                path: config.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        info!(path = %config.path.display(), "Opened RocksDB store");

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
        })
    }

    fn get_cf(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let db = self.db.read();
        let handle = db
            .cf_handle(cf)
            .ok_or(StorageError::MissingColumnFamily(cf))?;
        db.get_cf(handle, key)
            .map_err(|e| StorageError::Io(format!("RocksDB get failed: {}", e)))
    }

    fn write(
        &self,
        build: impl FnOnce(&DB, &mut WriteBatch) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let db = self.db.write();
        let mut batch = WriteBatch::default();
        build(&*db, &mut batch)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        db.write_opt(batch, &write_opts)
            .map_err(|e| StorageError::Io(format!("RocksDB batch write failed: {}", e)))
    }

    /// Live punishment record of one validator.
    pub fn producer_record(&self, validator: &str) -> Result<Option<u8>, StorageError> {
        Ok(self
            .get_cf(CF_PRODUCERS, validator.as_bytes())?
            .and_then(|bytes| bytes.first().copied()))
    }

    fn blacklist_at(&self, height: BeaconHeight) -> Result<Option<Blacklist>, StorageError> {
        self.get_cf(CF_BLACKLIST, &height_key(height))?
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| {
                    StorageError::Corrupt(format!("blacklist at height {}: {}", height, e))
                })
            })
            .transpose()
    }
}

impl ParamsStore for RocksDbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_cf(CF_PARAMS, key.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn write_batch(&self, batch: ParamsBatch) -> Result<(), StoreError> {
        let writes = batch.len();
        self.write(|db, wb| {
            let cf = db
                .cf_handle(CF_PARAMS)
                .ok_or(StorageError::MissingColumnFamily(CF_PARAMS))?;
            for (key, value) in &batch {
                wb.put_cf(cf, key.as_bytes(), value);
            }
            Ok(())
        })
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        debug!(writes, "Params batch written");
        Ok(())
    }
}

impl BlacklistStore for RocksDbStore {
    fn load(&self, height: BeaconHeight) -> Result<Option<Blacklist>, SlashingError> {
        self.blacklist_at(height)
            .map_err(|e| SlashingError::Store(e.to_string()))
    }

    fn apply(&self, batch: BlacklistBatch) -> Result<(), SlashingError> {
        let snapshot = serde_json::to_vec(&batch.blacklist)
            .map_err(|e| SlashingError::Store(e.to_string()))?;

        self.write(|db, wb| {
            let producers = db
                .cf_handle(CF_PRODUCERS)
                .ok_or(StorageError::MissingColumnFamily(CF_PRODUCERS))?;
            let blacklist = db
                .cf_handle(CF_BLACKLIST)
                .ok_or(StorageError::MissingColumnFamily(CF_BLACKLIST))?;

            for validator in &batch.delete {
                wb.delete_cf(producers, validator.as_bytes());
            }
            for (validator, epochs) in &batch.blacklist {
                wb.put_cf(producers, validator.as_bytes(), [*epochs]);
            }
            wb.put_cf(blacklist, height_key(batch.height), &snapshot);
            Ok(())
        })
        .map_err(|e| SlashingError::Store(e.to_string()))?;

        debug!(
            height = batch.height,
            deleted = batch.delete.len(),
            size = batch.blacklist.len(),
            "Blacklist batch written"
        );
        Ok(())
    }
}
