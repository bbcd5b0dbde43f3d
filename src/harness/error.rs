use crate::core::error::{Error, ErrorKind};
use crate::harness::perf::Phase;
use thiserror::Error;

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to open database: {0}")]
    Open(#[source] Error),

    #[error("{op} failed: {source}")]
    Operation {
        op: &'static str,
        #[source]
        source: Error,
    },

    #[error("Iterator error after {emitted} records: {source}")]
    Iterator {
        emitted: u64,
        #[source]
        source: Error,
    },

    #[error("Performance test {phase} failed at {index}: {source}")]
    BenchmarkAborted {
        phase: Phase,
        index: u64,
        #[source]
        source: Error,
    },

    #[error("Invalid batch file, line {line}: {reason}")]
    Load { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub(crate) fn operation(op: &'static str) -> impl FnOnce(Error) -> HarnessError {
        move |source| HarnessError::Operation { op, source }
    }

    /// Kind of the underlying store error, if there is one
    pub fn store_kind(&self) -> Option<ErrorKind> {
        match self {
            HarnessError::Open(source)
            | HarnessError::Operation { source, .. }
            | HarnessError::Iterator { source, .. }
            | HarnessError::BenchmarkAborted { source, .. } => Some(source.kind()),
            HarnessError::Load { .. } | HarnessError::Io(_) => None,
        }
    }
}
