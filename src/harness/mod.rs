//! Operation layer of the tester.
//!
//! A [`Harness`] owns exactly one open store. Every operation maps to one
//! call (or, for scans and benchmarks, one loop of calls) on the [`Store`]
//! contract and returns a typed outcome; printing is left to the caller.
//! Dropping the harness closes the store.

pub mod error;
pub mod load;
pub mod perf;
pub mod scan;

pub use error::{HarnessError, HarnessResult};
pub use load::{parse_records, LoadReport};
pub use perf::{perf_key, perf_value, PerfReport, Phase, PhaseTiming, DEFAULT_PERF_OPERATIONS};
pub use scan::{ScanReport, ScanWindow, DEFAULT_SCAN_LIMIT};

use crate::core::db::{Database, PROPERTY_MEMORY_USAGE, PROPERTY_NUM_ENTRIES, PROPERTY_STATS};
use crate::core::options::StoreOptions;
use crate::core::store::Store;
use crate::core::write_batch::WriteBatch;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Introspection values reported by the store; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub report: Option<String>,
    pub memory_usage: Option<String>,
    pub num_entries: Option<String>,
}

pub struct Harness<S: Store = Database> {
    store: S,
}

impl Harness<Database> {
    /// Open the bundled engine at `path`.
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> HarnessResult<Self> {
        let path = path.as_ref();
        let db = Database::open(path, options).map_err(HarnessError::Open)?;
        info!(path = %path.display(), "Database opened successfully");
        Ok(Self::new(db))
    }
}

impl<S: Store> Harness<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> HarnessResult<()> {
        self.store
            .put(key, value)
            .map_err(HarnessError::operation("Put"))?;
        debug!(key_len = key.len(), value_len = value.len(), "put");
        Ok(())
    }

    /// `Ok(None)` is the not-found outcome; `Err` is a real failure.
    pub fn get(&self, key: &[u8]) -> HarnessResult<Option<Vec<u8>>> {
        let value = self.store.get(key).map_err(HarnessError::operation("Get"))?;
        debug!(key_len = key.len(), found = value.is_some(), "get");
        Ok(value)
    }

    pub fn delete(&self, key: &[u8]) -> HarnessResult<()> {
        self.store
            .delete(key)
            .map_err(HarnessError::operation("Delete"))?;
        debug!(key_len = key.len(), "delete");
        Ok(())
    }

    /// Apply every pair as a put in one atomic batch, in the given order.
    pub fn batch_write<K, V>(&self, pairs: &[(K, V)]) -> HarnessResult<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut batch = WriteBatch::new();
        for (key, value) in pairs {
            batch.put(key.as_ref(), value.as_ref());
        }

        self.store
            .write(batch)
            .map_err(HarnessError::operation("Batch write"))?;
        debug!(pairs = pairs.len(), "batch write");
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            report: self.store.property(PROPERTY_STATS),
            memory_usage: self.store.property(PROPERTY_MEMORY_USAGE),
            num_entries: self.store.property(PROPERTY_NUM_ENTRIES),
        }
    }
}
