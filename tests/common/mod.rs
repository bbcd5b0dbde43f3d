#![allow(dead_code)]

pub mod data;
pub mod faulty;

use kvprobe::core::db::PROPERTY_NUM_ENTRIES;
use kvprobe::{BatchOperation, Error, Harness, Result, Store, StoreIterator, StoreOptions, WriteBatch};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

/// A database directory that lives as long as the returned `TempDir`
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("db");
    (dir, path)
}

/// Harness over the bundled engine in a fresh directory
pub fn open_temp_harness() -> (TempDir, Harness) {
    let (dir, path) = temp_db_path();
    let harness = Harness::open(&path, StoreOptions::default()).expect("Failed to open database");
    (dir, harness)
}

/// Ordered in-memory store used as a reference model
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries.lock().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        let mut entries = self.entries.lock();
        for op in batch.operations() {
            match op {
                BatchOperation::Put { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                BatchOperation::Delete { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }

    fn iter(&self) -> Box<dyn StoreIterator + '_> {
        Box::new(VecIterator::new(self.snapshot(), None))
    }

    fn property(&self, name: &str) -> Option<String> {
        (name == PROPERTY_NUM_ENTRIES).then(|| self.len().to_string())
    }
}

/// Iterator over a sorted vector that can be told to fail once it has
/// yielded `error_after` records
pub struct VecIterator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
    error_after: Option<usize>,
    yielded: usize,
    error: Option<Error>,
}

impl VecIterator {
    pub fn new(entries: Vec<(Vec<u8>, Vec<u8>)>, error_after: Option<usize>) -> Self {
        Self {
            pos: entries.len(),
            entries,
            error_after,
            yielded: 0,
            error: None,
        }
    }

    fn check_fault(&mut self) {
        if self.error_after == Some(self.yielded) && self.pos < self.entries.len() {
            self.error = Some(Error::CorruptedDatabase(format!(
                "injected iterator failure after {} records",
                self.yielded
            )));
        }
    }
}

impl StoreIterator for VecIterator {
    fn valid(&self) -> bool {
        self.error.is_none() && self.pos < self.entries.len()
    }

    fn seek_to_first(&mut self) {
        self.pos = 0;
        self.check_fault();
    }

    fn seek(&mut self, target: &[u8]) {
        self.pos = self.entries.partition_point(|(k, _)| k.as_slice() < target);
        self.check_fault();
    }

    fn next(&mut self) {
        self.pos += 1;
        self.yielded += 1;
        self.check_fault();
    }

    fn key(&self) -> &[u8] {
        &self.entries[self.pos].0
    }

    fn value(&self) -> &[u8] {
        &self.entries[self.pos].1
    }

    fn status(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
