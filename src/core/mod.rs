pub mod db;
pub mod error;
pub mod iterator;
pub mod memtable;
pub mod options;
pub mod store;
pub mod table;
pub mod wal;
pub mod write_batch;

pub use self::db::{Database, PROPERTY_MEMORY_USAGE, PROPERTY_NUM_ENTRIES, PROPERTY_STATS};
pub use self::error::{Error, ErrorKind, Result};
pub use self::options::StoreOptions;
pub use self::store::{Store, StoreIterator};
pub use self::write_batch::{BatchOperation, WriteBatch};
