use crate::core::error::{Error, Result};
use crate::core::iterator::DbIterator;
use crate::core::memtable::MemTable;
use crate::core::options::StoreOptions;
use crate::core::store::{Store, StoreIterator};
use crate::core::table::Table;
use crate::core::wal::WriteAheadLog;
use crate::core::write_batch::{BatchOperation, WriteBatch};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LOCK_FILE: &str = "LOCK";
pub const WAL_FILE: &str = "WAL";
pub const TABLE_FILE: &str = "TABLE";

pub const PROPERTY_STATS: &str = "kvprobe.stats";
pub const PROPERTY_MEMORY_USAGE: &str = "kvprobe.approximate-memory-usage";
pub const PROPERTY_NUM_ENTRIES: &str = "kvprobe.num-entries";

#[derive(Debug, Default)]
struct DbCounters {
    puts: AtomicU64,
    deletes: AtomicU64,
    batches: AtomicU64,
    gets: AtomicU64,
    flushes: AtomicU64,
    replayed_records: AtomicU64,
}

/// The bundled engine: a memtable in front of one sorted table file, with a
/// write-ahead log for everything not yet flushed.
///
/// One process at a time may hold a database directory open; the lock is
/// released when the value is dropped.
pub struct Database {
    path: PathBuf,
    options: StoreOptions,
    memtable: RwLock<Arc<MemTable>>,
    table: RwLock<Arc<Table>>,
    wal: WriteAheadLog,
    write_lock: Mutex<()>,
    counters: DbCounters,
    /// Keys with a value; maintained by `commit`
    live_entries: AtomicUsize,
    _lock_file: File,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("memtable_bytes", &self.memtable.read().size_bytes())
            .field("table_entries", &self.table.read().len())
            .field("wal_bytes", &self.wal.size_bytes())
            .finish()
    }
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        options.validate()?;

        if !path.exists() {
            if !options.create_if_missing {
                return Err(Error::DatabaseNotFound {
                    path: path.display().to_string(),
                });
            }
            fs::create_dir_all(&path)?;
            info!(path = %path.display(), "Created database directory");
        } else if !path.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|e| Error::LockFailed {
                resource: format!("{}: {}", lock_path.display(), e),
            })?;

        let table = Table::load(&path.join(TABLE_FILE))?;
        let (wal, records) = WriteAheadLog::open(&path.join(WAL_FILE), options.sync_writes)?;

        let memtable = MemTable::new();
        for record in &records {
            for op in &record.operations {
                apply(&memtable, op.clone());
            }
        }
        let memtable = Arc::new(memtable);
        let table = Arc::new(table);
        let live_entries = count_live(&memtable, &table);

        let counters = DbCounters::default();
        counters
            .replayed_records
            .store(records.len() as u64, Ordering::Relaxed);

        info!(
            path = %path.display(),
            table_entries = table.len(),
            replayed_records = records.len(),
            live_entries,
            write_buffer_size = options.write_buffer_size,
            max_open_files = options.max_open_files,
            "Database opened"
        );

        Ok(Self {
            path,
            options,
            memtable: RwLock::new(memtable),
            table: RwLock::new(table),
            wal,
            write_lock: Mutex::new(()),
            counters,
            live_entries: AtomicUsize::new(live_entries),
            _lock_file: lock_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log `operations` as one record, apply them, then flush if the
    /// memtable outgrew the write buffer.
    ///
    /// The write is acknowledged once its record is in the log. A flush that
    /// fails afterwards leaves the memtable and log as they are and is
    /// retried by the next commit.
    fn commit(&self, operations: Vec<BatchOperation>) -> Result<()> {
        let _guard = self.write_lock.lock();

        self.wal.append(operations.clone())?;
        let memtable = self.memtable.read().clone();
        let table = self.table.read().clone();
        for op in operations {
            let was_live = is_live(&memtable, &table, op.key());
            let now_live = matches!(op, BatchOperation::Put { .. });
            apply(&memtable, op);
            match (was_live, now_live) {
                (false, true) => {
                    self.live_entries.fetch_add(1, Ordering::Relaxed);
                }
                (true, false) => {
                    self.live_entries.fetch_sub(1, Ordering::Relaxed);
                }
                _ => {}
            }
        }

        if memtable.size_bytes() >= self.options.write_buffer_size {
            if let Err(err) = self.flush_locked(&memtable) {
                warn!(
                    error = %err,
                    memtable_bytes = memtable.size_bytes(),
                    "Flush failed, keeping data in the memtable"
                );
            }
        }
        Ok(())
    }

    /// Merge the memtable into the table file and start an empty log.
    pub fn flush(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let memtable = self.memtable.read().clone();
        if memtable.is_empty() {
            return Ok(());
        }
        self.flush_locked(&memtable)
    }

    fn flush_locked(&self, memtable: &MemTable) -> Result<()> {
        let merged = self.table.read().merge(memtable);
        merged.persist(&self.path.join(TABLE_FILE))?;

        *self.table.write() = Arc::new(merged);
        *self.memtable.write() = Arc::new(MemTable::new());
        self.wal.reset()?;

        let flushes = self.counters.flushes.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            flushes,
            table_entries = self.table.read().len(),
            "Memtable flushed"
        );
        Ok(())
    }

    fn memory_usage(&self) -> usize {
        self.memtable.read().size_bytes() + self.table.read().size_bytes()
    }

    fn stats_report(&self) -> String {
        let memtable = self.memtable.read().clone();
        let table = self.table.read().clone();
        let table_file_bytes = fs::metadata(self.path.join(TABLE_FILE))
            .map(|m| m.len())
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(out, "Path:              {}", self.path.display());
        let _ = writeln!(out, "Memtable");
        let _ = writeln!(out, "  entries:         {}", memtable.len());
        let _ = writeln!(out, "  tombstones:      {}", memtable.tombstones());
        let _ = writeln!(out, "  bytes:           {}", memtable.size_bytes());
        let _ = writeln!(out, "Table");
        let _ = writeln!(out, "  entries:         {}", table.len());
        let _ = writeln!(out, "  file bytes:      {}", table_file_bytes);
        let _ = writeln!(out, "WAL");
        let _ = writeln!(out, "  bytes:           {}", self.wal.size_bytes());
        let _ = writeln!(out, "  last sequence:   {}", self.wal.last_sequence());
        let _ = writeln!(
            out,
            "  replayed:        {}",
            self.counters.replayed_records.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "Operations since open");
        let _ = writeln!(
            out,
            "  puts:            {}",
            self.counters.puts.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "  deletes:         {}",
            self.counters.deletes.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "  batches:         {}",
            self.counters.batches.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "  gets:            {}",
            self.counters.gets.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            out,
            "  flushes:         {}",
            self.counters.flushes.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "Options");
        let _ = writeln!(
            out,
            "  write buffer:    {}",
            self.options.write_buffer_size
        );
        let _ = write!(out, "  max open files:  {}", self.options.max_open_files);
        out
    }
}

fn is_live(memtable: &MemTable, table: &Table, key: &[u8]) -> bool {
    match memtable.get(key) {
        Some(value) => value.is_some(),
        None => table.get(key).is_some(),
    }
}

/// Full merged scan; only run at open, after which `commit` keeps the count.
fn count_live(memtable: &Arc<MemTable>, table: &Arc<Table>) -> usize {
    let mut iter = DbIterator::new(Arc::clone(memtable), Arc::clone(table));
    iter.seek_to_first();
    let mut count = 0;
    while iter.valid() {
        count += 1;
        iter.next();
    }
    count
}

fn apply(memtable: &MemTable, op: BatchOperation) {
    match op {
        BatchOperation::Put { key, value } => memtable.insert(key, value),
        BatchOperation::Delete { key } => memtable.delete(key),
    }
}

impl Store for Database {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.counters.gets.fetch_add(1, Ordering::Relaxed);

        let memtable = self.memtable.read().clone();
        if let Some(value) = memtable.get(key) {
            return Ok(value);
        }
        Ok(self.table.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.commit(vec![BatchOperation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }])?;
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.commit(vec![BatchOperation::Delete { key: key.to_vec() }])?;
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let len = batch.len();
        self.commit(batch.into_operations())?;
        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        debug!(operations = len, "Batch applied");
        Ok(())
    }

    fn iter(&self) -> Box<dyn StoreIterator + '_> {
        let memtable = self.memtable.read().clone();
        let table = self.table.read().clone();
        Box::new(DbIterator::new(memtable, table))
    }

    fn property(&self, name: &str) -> Option<String> {
        match name {
            PROPERTY_STATS => Some(self.stats_report()),
            PROPERTY_MEMORY_USAGE => Some(self.memory_usage().to_string()),
            PROPERTY_NUM_ENTRIES => Some(self.live_entries.load(Ordering::Relaxed).to_string()),
            _ => None,
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_buffer() -> StoreOptions {
        StoreOptions::default().write_buffer_size(64 * 1024)
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");

        let db = Database::open(&path, StoreOptions::default()).unwrap();
        assert!(path.join(LOCK_FILE).exists());
        assert!(path.join(WAL_FILE).exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_open_missing_without_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");

        let err = Database::open(&path, StoreOptions::default().create_if_missing(false))
            .unwrap_err();
        assert!(matches!(err, Error::DatabaseNotFound { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _db = Database::open(dir.path(), StoreOptions::default()).unwrap();

        let err = Database::open(dir.path(), StoreOptions::default()).unwrap_err();
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Locked);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        drop(Database::open(dir.path(), StoreOptions::default()).unwrap());
        assert!(Database::open(dir.path(), StoreOptions::default()).is_ok());
    }

    #[test]
    fn test_point_operations() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();

        assert_eq!(db.get(b"hello").unwrap(), None);
        db.put(b"hello", b"world").unwrap();
        assert_eq!(db.get(b"hello").unwrap(), Some(b"world".to_vec()));
        db.delete(b"hello").unwrap();
        assert_eq!(db.get(b"hello").unwrap(), None);
        db.delete(b"never-written").unwrap();
    }

    #[test]
    fn test_flush_moves_data_to_table() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), small_buffer()).unwrap();

        let value = vec![b'v'; 1024];
        for i in 0..200 {
            db.put(format!("key_{:04}", i).as_bytes(), &value).unwrap();
        }
        db.delete(b"key_0000").unwrap();

        assert!(db.counters.flushes.load(Ordering::Relaxed) >= 1);
        assert!(dir.path().join(TABLE_FILE).exists());
        assert_eq!(db.get(b"key_0000").unwrap(), None);
        assert_eq!(db.get(b"key_0199").unwrap(), Some(value.clone()));
        assert_eq!(db.property(PROPERTY_NUM_ENTRIES).unwrap(), "199");
    }

    #[test]
    fn test_reopen_recovers_table_and_wal() {
        let dir = tempdir().unwrap();
        {
            let db = Database::open(dir.path(), small_buffer()).unwrap();
            let value = vec![b'v'; 1024];
            for i in 0..100 {
                db.put(format!("key_{:04}", i).as_bytes(), &value).unwrap();
            }
            db.put(b"tail", b"in-wal").unwrap();
        }

        let db = Database::open(dir.path(), small_buffer()).unwrap();
        assert_eq!(db.get(b"tail").unwrap(), Some(b"in-wal".to_vec()));
        assert!(db.get(b"key_0000").unwrap().is_some());
        assert_eq!(db.property(PROPERTY_NUM_ENTRIES).unwrap(), "101");
    }

    #[test]
    fn test_explicit_flush_then_delete_shadows_table() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();

        db.put(b"a", b"1").unwrap();
        db.flush().unwrap();
        db.delete(b"a").unwrap();
        assert_eq!(db.get(b"a").unwrap(), None);

        let mut iter = db.iter();
        iter.seek_to_first();
        assert!(!iter.valid());
    }

    #[test]
    fn test_properties() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
        db.put(b"k", b"v").unwrap();

        let stats = db.property(PROPERTY_STATS).unwrap();
        assert!(stats.contains("Memtable"));
        assert!(stats.contains("puts:            1"));

        let memory: usize = db.property(PROPERTY_MEMORY_USAGE).unwrap().parse().unwrap();
        assert!(memory > 0);
        assert!(db.property("kvprobe.unknown").is_none());
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
        db.write(WriteBatch::new()).unwrap();
        assert_eq!(db.wal.size_bytes(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_flush_keeps_write_acknowledged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let db = Database::open(&path, small_buffer()).unwrap();

        // The open log survives the unlink; the table file cannot be written
        fs::remove_dir_all(&path).unwrap();

        let value = vec![b'v'; 1024];
        for i in 0..100 {
            db.put(format!("key_{:04}", i).as_bytes(), &value).unwrap();
        }
        let mut batch = WriteBatch::new();
        batch.put(b"batched".to_vec(), b"1".to_vec());
        batch.delete(b"key_0000".to_vec());
        db.write(batch).unwrap();

        assert_eq!(db.counters.flushes.load(Ordering::Relaxed), 0);
        assert_eq!(db.get(b"key_0099").unwrap(), Some(value.clone()));
        assert_eq!(db.get(b"batched").unwrap(), Some(b"1".to_vec()));
        assert_eq!(db.get(b"key_0000").unwrap(), None);

        fs::create_dir_all(&path).unwrap();
        db.put(b"retry", b"1").unwrap();
        assert_eq!(db.counters.flushes.load(Ordering::Relaxed), 1);
        assert!(path.join(TABLE_FILE).exists());
        assert_eq!(db.get(b"key_0099").unwrap(), Some(value));
        assert_eq!(db.property(PROPERTY_NUM_ENTRIES).unwrap(), "101");
    }

    #[test]
    fn test_num_entries_tracks_overwrites_and_deletes() {
        let dir = tempdir().unwrap();
        {
            let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
            db.put(b"a", b"1").unwrap();
            db.put(b"a", b"2").unwrap();
            db.put(b"b", b"1").unwrap();
            db.flush().unwrap();

            // Shadowing a table entry with a tombstone, then reviving it
            db.delete(b"a").unwrap();
            db.delete(b"a").unwrap();
            db.delete(b"missing").unwrap();
            assert_eq!(db.property(PROPERTY_NUM_ENTRIES).unwrap(), "1");

            let mut batch = WriteBatch::new();
            batch.put(b"c".to_vec(), b"1".to_vec());
            batch.delete(b"c".to_vec());
            batch.put(b"a".to_vec(), b"3".to_vec());
            db.write(batch).unwrap();
            assert_eq!(db.property(PROPERTY_NUM_ENTRIES).unwrap(), "2");
        }

        let db = Database::open(dir.path(), StoreOptions::default()).unwrap();
        assert_eq!(db.property(PROPERTY_NUM_ENTRIES).unwrap(), "2");
        assert_eq!(db.get(b"a").unwrap(), Some(b"3".to_vec()));
    }
}
