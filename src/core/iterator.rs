use crate::core::error::Result;
use crate::core::memtable::MemTable;
use crate::core::store::StoreIterator;
use crate::core::table::Table;
use std::cmp::Ordering;
use std::ops::Bound;
use std::sync::Arc;

/// Merging cursor over the memtable and the table.
///
/// The memtable shadows the table for equal keys and its tombstones hide
/// table entries. The cursor pins the memtable and table that were current
/// when it was created, so a flush does not disturb it; writes made to the
/// pinned memtable afterwards are visible.
pub struct DbIterator {
    memtable: Arc<MemTable>,
    table: Arc<Table>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

fn borrow_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(key) => Bound::Included(key.as_slice()),
        Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl DbIterator {
    pub(crate) fn new(memtable: Arc<MemTable>, table: Arc<Table>) -> Self {
        Self {
            memtable,
            table,
            current: None,
        }
    }

    /// Move to the first live entry satisfying `lower`.
    fn settle(&mut self, mut lower: Bound<Vec<u8>>) {
        loop {
            let from_mem = self.memtable.first_from(borrow_bound(&lower));
            let from_table = self
                .table
                .first_from(borrow_bound(&lower))
                .map(|(k, v)| (k.clone(), Some(v.clone())));

            let candidate = match (from_mem, from_table) {
                (None, None) => None,
                (Some(mem), None) => Some(mem),
                (None, Some(table)) => Some(table),
                (Some(mem), Some(table)) => match mem.0.cmp(&table.0) {
                    Ordering::Less | Ordering::Equal => Some(mem),
                    Ordering::Greater => Some(table),
                },
            };

            match candidate {
                None => {
                    self.current = None;
                    return;
                }
                Some((key, Some(value))) => {
                    self.current = Some((key, value));
                    return;
                }
                Some((key, None)) => lower = Bound::Excluded(key),
            }
        }
    }
}

impl StoreIterator for DbIterator {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn seek_to_first(&mut self) {
        self.settle(Bound::Unbounded);
    }

    fn seek(&mut self, target: &[u8]) {
        self.settle(Bound::Included(target.to_vec()));
    }

    fn next(&mut self) {
        if let Some((key, _)) = self.current.take() {
            self.settle(Bound::Excluded(key));
        }
    }

    fn key(&self) -> &[u8] {
        match &self.current {
            Some((key, _)) => key,
            None => &[],
        }
    }

    fn value(&self) -> &[u8] {
        match &self.current {
            Some((_, value)) => value,
            None => &[],
        }
    }

    fn status(&self) -> Result<()> {
        Ok(())
    }
}
