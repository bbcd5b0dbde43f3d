//! Two-phase write/read throughput measurement.
//!
//! The write phase puts `n` synthesized records, the read phase gets each
//! of them back and requires it to be present. Each phase is timed as one
//! wall-clock span over all of its operations. The first failure in either
//! phase ends the whole run; no figures are produced for a failed run.

use crate::core::error::Error;
use crate::core::store::Store;
use crate::harness::{Harness, HarnessError, HarnessResult};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

pub const DEFAULT_PERF_OPERATIONS: u64 = 10_000;

const VALUE_FILLER_LEN: usize = 100;

pub fn perf_key(index: u64) -> String {
    format!("perf_key_{}", index)
}

pub fn perf_value(index: u64) -> String {
    format!("perf_value_{}_{}", index, "x".repeat(VALUE_FILLER_LEN))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Write,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Write => f.write_str("write"),
            Phase::Read => f.write_str("read"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    pub operations: u64,
    pub elapsed: Duration,
}

impl PhaseTiming {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// `operations * 1000 / elapsed_ms`, or `None` when the phase finished
    /// in under a millisecond and the rate cannot be measured.
    pub fn ops_per_sec(&self) -> Option<f64> {
        match self.elapsed_ms() {
            0 => None,
            ms => Some(self.operations as f64 * 1000.0 / ms as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfReport {
    pub operations: u64,
    pub write: PhaseTiming,
    pub read: PhaseTiming,
}

impl<S: Store> Harness<S> {
    pub fn perf(&self, operations: u64) -> HarnessResult<PerfReport> {
        info!(operations, "Starting performance test");

        let start = Instant::now();
        for i in 0..operations {
            let key = perf_key(i);
            let value = perf_value(i);
            self.store()
                .put(key.as_bytes(), value.as_bytes())
                .map_err(|source| HarnessError::BenchmarkAborted {
                    phase: Phase::Write,
                    index: i,
                    source,
                })?;
        }
        let write = PhaseTiming {
            operations,
            elapsed: start.elapsed(),
        };
        info!(elapsed_ms = write.elapsed_ms() as u64, "Write phase complete");

        let start = Instant::now();
        for i in 0..operations {
            let key = perf_key(i);
            let found = self.store().get(key.as_bytes()).map_err(|source| {
                HarnessError::BenchmarkAborted {
                    phase: Phase::Read,
                    index: i,
                    source,
                }
            })?;
            if found.is_none() {
                return Err(HarnessError::BenchmarkAborted {
                    phase: Phase::Read,
                    index: i,
                    source: Error::KeyNotFound,
                });
            }
        }
        let read = PhaseTiming {
            operations,
            elapsed: start.elapsed(),
        };
        info!(elapsed_ms = read.elapsed_ms() as u64, "Read phase complete");

        Ok(PerfReport {
            operations,
            write,
            read,
        })
    }
}
