use crate::core::store::Store;
use crate::harness::{Harness, HarnessError, HarnessResult};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub records: usize,
}

fn is_separator(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Parse `key value` lines.
///
/// The key runs up to the first space or tab and the value is the rest of
/// the line, verbatim. Blank lines are skipped and a trailing `\r` is
/// dropped. Line numbers in errors are 1-based.
pub fn parse_records(data: &[u8]) -> HarnessResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut records = Vec::new();

    for (index, raw) in data.split(|&b| b == b'\n').enumerate() {
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        if line.iter().all(|&b| is_separator(b)) {
            continue;
        }

        let Some(split) = line.iter().position(|&b| is_separator(b)) else {
            return Err(HarnessError::Load {
                line: index + 1,
                reason: "expected `key value`, found no separator".to_string(),
            });
        };
        if split == 0 {
            return Err(HarnessError::Load {
                line: index + 1,
                reason: "empty key".to_string(),
            });
        }

        records.push((line[..split].to_vec(), line[split + 1..].to_vec()));
    }

    Ok(records)
}

impl<S: Store> Harness<S> {
    /// Load `key value` lines from `data` as one atomic batch.
    ///
    /// A malformed line rejects the whole input before anything is written.
    pub fn load(&self, data: &[u8]) -> HarnessResult<LoadReport> {
        let records = parse_records(data)?;
        self.batch_write(&records)?;
        info!(records = records.len(), "Batch load complete");
        Ok(LoadReport {
            records: records.len(),
        })
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> HarnessResult<LoadReport> {
        let data = fs::read(path.as_ref())?;
        self.load(&data)
    }
}
