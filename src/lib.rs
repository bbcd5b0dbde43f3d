pub mod core;
pub mod harness;

pub use crate::core::db::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::options::StoreOptions;
pub use crate::core::store::{Store, StoreIterator};
pub use crate::core::write_batch::{BatchOperation, WriteBatch};
pub use crate::harness::{
    Harness, HarnessError, HarnessResult, LoadReport, PerfReport, Phase, PhaseTiming, ScanReport,
    ScanWindow, StoreStats,
};
