//! CLI error handling utilities
//!
//! Every failure the CLI can report, with the exit code and a short
//! category used in log records.

use std::fmt;

use kvprobe::{ErrorKind, HarnessError};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI exit codes
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// Any failed command, including store and I/O errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Invalid command line usage
    pub const USAGE_ERROR: i32 = 1;
}

#[derive(Debug)]
pub enum CliError {
    /// Missing or malformed command line input
    Usage(String),
    /// Input rejected before touching the store
    Validation(String),
    /// Failure reported by the harness or the store beneath it
    Harness(HarnessError),
}

impl CliError {
    /// Get the appropriate exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exit_codes::USAGE_ERROR,
            CliError::Validation(_) | CliError::Harness(_) => exit_codes::GENERAL_ERROR,
        }
    }

    /// Get a short error category name for logging
    pub fn category(&self) -> &'static str {
        match self {
            CliError::Usage(_) => "USAGE",
            CliError::Validation(_) => "VALIDATION",
            CliError::Harness(HarnessError::Load { .. }) => "VALIDATION",
            CliError::Harness(HarnessError::Io(_)) => "IO",
            CliError::Harness(err) => match err.store_kind() {
                Some(ErrorKind::Io) => "IO",
                Some(ErrorKind::Corruption) => "CORRUPTION",
                Some(ErrorKind::NotFound) => "NOT_FOUND",
                Some(ErrorKind::InvalidArgument) => "INVALID_ARGUMENT",
                Some(ErrorKind::Locked) => "LOCKED",
                None => "DATABASE",
            },
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "Usage error: {}", msg),
            CliError::Validation(msg) => write!(f, "Validation error: {}", msg),
            CliError::Harness(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Harness(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        CliError::Harness(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Harness(HarnessError::Io(err))
    }
}

/// Missing arguments surface as `.ok_or("x argument is required")?`
impl From<&str> for CliError {
    fn from(msg: &str) -> Self {
        CliError::Usage(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvprobe::Error;

    #[test]
    fn test_every_failure_exits_with_one() {
        let errors = [
            CliError::from("key argument is required"),
            CliError::Validation("not a file".into()),
            CliError::Harness(HarnessError::Open(Error::LockFailed {
                resource: "LOCK".into(),
            })),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1, "{}", err);
        }
    }

    #[test]
    fn test_category_follows_store_kind() {
        let locked = CliError::Harness(HarnessError::Open(Error::LockFailed {
            resource: "LOCK".into(),
        }));
        assert_eq!(locked.category(), "LOCKED");

        let corrupt = CliError::Harness(HarnessError::Iterator {
            emitted: 3,
            source: Error::CorruptedDatabase("bad block".into()),
        });
        assert_eq!(corrupt.category(), "CORRUPTION");

        let vanished = std::io::Error::new(std::io::ErrorKind::NotFound, "TABLE.tmp");
        let failed_put = CliError::Harness(HarnessError::Operation {
            op: "Put",
            source: Error::from(vanished),
        });
        assert_eq!(failed_put.category(), "IO");

        let load = CliError::Harness(HarnessError::Load {
            line: 2,
            reason: "empty key".into(),
        });
        assert_eq!(load.category(), "VALIDATION");
    }

    #[test]
    fn test_display_keeps_harness_message() {
        let err = CliError::Harness(HarnessError::Operation {
            op: "Put",
            source: Error::Io("disk full".into()),
        });
        assert_eq!(err.to_string(), "Put failed: IO error: disk full");
    }
}
