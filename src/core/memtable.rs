use crossbeam_skiplist::SkipMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-entry bookkeeping overhead used for size estimates
const ENTRY_OVERHEAD: usize = 16;

/// Sorted in-memory write buffer. A `None` value is a tombstone.
#[derive(Debug)]
pub struct MemTable {
    map: SkipMap<Vec<u8>, Option<Vec<u8>>>,
    size_bytes: AtomicUsize,
}

fn entry_size(key: &[u8], value: &Option<Vec<u8>>) -> usize {
    key.len() + value.as_ref().map_or(0, Vec::len) + ENTRY_OVERHEAD
}

impl MemTable {
    pub fn new() -> Self {
        Self {
            map: SkipMap::new(),
            size_bytes: AtomicUsize::new(0),
        }
    }

    fn upsert(&self, key: Vec<u8>, value: Option<Vec<u8>>) {
        let size_delta = entry_size(&key, &value);

        if let Some(old_entry) = self.map.get(&key) {
            let old_size = entry_size(&key, old_entry.value());
            self.size_bytes.fetch_sub(old_size, Ordering::Relaxed);
        }

        self.map.insert(key, value);
        self.size_bytes.fetch_add(size_delta, Ordering::Relaxed);
    }

    pub fn insert(&self, key: Vec<u8>, value: Vec<u8>) {
        self.upsert(key, Some(value));
    }

    /// Tombstones stay in the map so they shadow the table file.
    pub fn delete(&self, key: Vec<u8>) {
        self.upsert(key, None);
    }

    /// `None` when the memtable knows nothing about `key`, `Some(None)` for a
    /// tombstone.
    pub fn get(&self, key: &[u8]) -> Option<Option<Vec<u8>>> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// First entry whose key satisfies `lower`, tombstones included.
    pub fn first_from(&self, lower: Bound<&[u8]>) -> Option<(Vec<u8>, Option<Vec<u8>>)> {
        self.map
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    /// All entries in key order, tombstones included
    pub fn entries(&self) -> impl Iterator<Item = (Vec<u8>, Option<Vec<u8>>)> + '_ {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn tombstones(&self) -> usize {
        self.map.iter().filter(|entry| entry.value().is_none()).count()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
