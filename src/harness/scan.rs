use crate::core::store::Store;
use crate::harness::{Harness, HarnessError, HarnessResult};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_SCAN_LIMIT: i64 = 100;

/// Bounds of a range scan.
///
/// An empty `start` scans from the first key. A non-empty `end` is an
/// inclusive upper bound compared byte-wise. A `max_count` of zero or less
/// emits nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
    pub max_count: i64,
}

impl Default for ScanWindow {
    fn default() -> Self {
        Self {
            start: Vec::new(),
            end: Vec::new(),
            max_count: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl ScanWindow {
    pub fn new(start: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>, max_count: i64) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            max_count,
        }
    }

    fn past_end(&self, key: &[u8]) -> bool {
        !self.end.is_empty() && key > self.end.as_slice()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub emitted: u64,
}

impl<S: Store> Harness<S> {
    /// Walk `window` in key order, handing each record to `visit`.
    ///
    /// Stops at exhaustion, at `max_count` records, or at the first key
    /// past `end`. An error state left on the iterator is returned after
    /// the loop together with the number of records already emitted.
    pub fn scan<F>(&self, window: &ScanWindow, mut visit: F) -> HarnessResult<ScanReport>
    where
        F: FnMut(&[u8], &[u8]),
    {
        let mut iter = self.store().iter();
        if window.start.is_empty() {
            iter.seek_to_first();
        } else {
            iter.seek(&window.start);
        }

        let mut emitted: u64 = 0;
        while iter.valid() && (emitted as i64) < window.max_count {
            if window.past_end(iter.key()) {
                break;
            }
            visit(iter.key(), iter.value());
            iter.next();
            emitted += 1;
        }

        iter.status()
            .map_err(|source| HarnessError::Iterator { emitted, source })?;

        debug!(emitted, max_count = window.max_count, "scan complete");
        Ok(ScanReport { emitted })
    }

    /// Convenience wrapper collecting the scanned records.
    pub fn scan_collect(&self, window: &ScanWindow) -> HarnessResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut records = Vec::new();
        self.scan(window, |key, value| records.push((key.to_vec(), value.to_vec())))?;
        Ok(records)
    }
}
