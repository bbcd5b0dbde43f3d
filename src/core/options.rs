use crate::core::error::{Error, Result};

/// Smallest accepted memtable budget.
pub const MIN_WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// The engine keeps the WAL and the table open at the same time.
pub const MIN_OPEN_FILES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub create_if_missing: bool,
    /// Memtable size in bytes before it is flushed into the table file
    pub write_buffer_size: usize,
    pub max_open_files: usize,
    /// fsync the WAL after every write
    pub sync_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            write_buffer_size: 4 * 1024 * 1024, // 4MB
            max_open_files: 1000,
            sync_writes: false,
        }
    }
}

impl StoreOptions {
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.write_buffer_size = bytes;
        self
    }

    pub fn max_open_files(mut self, files: usize) -> Self {
        self.max_open_files = files;
        self
    }

    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.write_buffer_size < MIN_WRITE_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "write_buffer_size must be at least {} bytes, got {}",
                MIN_WRITE_BUFFER_SIZE, self.write_buffer_size
            )));
        }
        if self.max_open_files < MIN_OPEN_FILES {
            return Err(Error::Config(format!(
                "max_open_files must be at least {}, got {}",
                MIN_OPEN_FILES, self.max_open_files
            )));
        }
        Ok(())
    }
}
