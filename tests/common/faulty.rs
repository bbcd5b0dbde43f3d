use super::{MemoryStore, VecIterator};
use kvprobe::{Error, Result, Store, StoreIterator, WriteBatch};
use std::cell::Cell;

/// Store wrapper that fails selected calls
///
/// Call indices are 0-based and counted per operation kind.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_put_at: Option<u64>,
    fail_get_at: Option<u64>,
    /// `get` of this key reports not-found even after a put
    lose_key: Option<Vec<u8>>,
    fail_write: bool,
    iter_error_after: Option<usize>,
    puts: Cell<u64>,
    gets: Cell<u64>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_put_at(index: u64) -> Self {
        Self {
            fail_put_at: Some(index),
            ..Self::default()
        }
    }

    pub fn failing_get_at(index: u64) -> Self {
        Self {
            fail_get_at: Some(index),
            ..Self::default()
        }
    }

    pub fn losing_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.lose_key = Some(key.into());
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_write = true;
        self
    }

    /// The iterator reports an error once it has yielded `count` entries
    pub fn iter_error_after(mut self, count: usize) -> Self {
        self.iter_error_after = Some(count);
        self
    }

    pub fn put_calls(&self) -> u64 {
        self.puts.get()
    }

    pub fn get_calls(&self) -> u64 {
        self.gets.get()
    }

    fn injected(what: &str) -> Error {
        Error::Io(format!("injected {} failure", what))
    }
}

impl Store for FaultyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let call = self.gets.get();
        self.gets.set(call + 1);
        if self.fail_get_at == Some(call) {
            return Err(Self::injected("get"));
        }
        if self.lose_key.as_deref() == Some(key) {
            return Ok(None);
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let call = self.puts.get();
        self.puts.set(call + 1);
        if self.fail_put_at == Some(call) {
            return Err(Self::injected("put"));
        }
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.delete(key)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        if self.fail_write {
            return Err(Self::injected("batch"));
        }
        self.inner.write(batch)
    }

    fn iter(&self) -> Box<dyn StoreIterator + '_> {
        Box::new(VecIterator::new(self.inner.snapshot(), self.iter_error_after))
    }

    fn property(&self, name: &str) -> Option<String> {
        self.inner.property(name)
    }
}
