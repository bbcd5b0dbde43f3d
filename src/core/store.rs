//! The narrow contract the harness drives.
//!
//! Opening is engine specific (see [`crate::core::db::Database::open`]); once
//! open, every engine is used only through these two traits.

use crate::core::error::Result;
use crate::core::write_batch::WriteBatch;

/// Forward cursor over a store, ordered by raw byte comparison of keys.
///
/// `key` and `value` may only be called while `valid` returns true.
pub trait StoreIterator {
    fn valid(&self) -> bool;

    fn seek_to_first(&mut self);

    /// Position at the first key greater than or equal to `target`
    fn seek(&mut self, target: &[u8]);

    fn next(&mut self);

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];

    /// Error state reached while iterating. Running off the end is not an
    /// error.
    fn status(&self) -> Result<()>;
}

pub trait Store {
    /// `Ok(None)` when the key is absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Deleting an absent key succeeds
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Apply every operation of `batch` or none of them
    fn write(&self, batch: WriteBatch) -> Result<()>;

    fn iter(&self) -> Box<dyn StoreIterator + '_>;

    /// Named introspection value; `None` when the engine does not know `name`
    fn property(&self, name: &str) -> Option<String>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        (**self).write(batch)
    }

    fn iter(&self) -> Box<dyn StoreIterator + '_> {
        (**self).iter()
    }

    fn property(&self, name: &str) -> Option<String> {
        (**self).property(name)
    }
}
