use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a store error.
///
/// Callers branch on the kind instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Io,
    Corruption,
    NotFound,
    InvalidArgument,
    Locked,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "io",
            ErrorKind::Corruption => "corruption",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Locked => "locked",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Key not found")]
    KeyNotFound,

    #[error("Database not found: {path}")]
    DatabaseNotFound { path: String },

    #[error("Lock acquisition failed: {resource}")]
    LockFailed { resource: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Corrupted database: {0}")]
    CorruptedDatabase(String),

    #[error("Checksum mismatch - expected: {expected:08x}, actual: {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("WAL corruption at offset {offset}: {reason}")]
    WalCorruption { offset: u64, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::KeyNotFound | Error::DatabaseNotFound { .. } => ErrorKind::NotFound,
            Error::LockFailed { .. } => ErrorKind::Locked,
            Error::Config(_) | Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::CorruptedDatabase(_)
            | Error::ChecksumMismatch { .. }
            | Error::WalCorruption { .. }
            | Error::Serialization(_) => ErrorKind::Corruption,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_corruption(&self) -> bool {
        self.kind() == ErrorKind::Corruption
    }
}

/// Every OS-level failure is an I/O error, including a missing file part-way
/// through an operation. A missing database is only reported by `open`.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                Error::Io(format!("Permission denied: {}", err))
            }
            _ => Error::Io(err.to_string()),
        }
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(err: bincode::error::EncodeError) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(err: bincode::error::DecodeError) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::KeyNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(Error::Io("disk".into()).kind(), ErrorKind::Io);
        assert_eq!(
            Error::LockFailed {
                resource: "LOCK".into()
            }
            .kind(),
            ErrorKind::Locked
        );
        assert!(Error::ChecksumMismatch {
            expected: 1,
            actual: 2
        }
        .is_corruption());
        assert!(!Error::Io("x".into()).is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.is_not_found());

        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_display_carries_detail() {
        let err = Error::WalCorruption {
            offset: 42,
            reason: "bad length".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("bad length"));
    }
}
