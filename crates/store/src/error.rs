//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every failure is surfaced once to the
//! caller; nothing in this crate retries on its own.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The database could not be opened, created or upgraded.
    #[display("could not open media database")]
    Open,
    /// The database on disk has a newer schema than the one requested. Always
    /// raised as the cause of an [`Open`](Self::Open) error.
    #[display("database version conflict: stored version {stored} is newer than requested version {requested}")]
    VersionConflict { stored: u32, requested: u32 },
    /// The database configuration was rejected before anything was opened.
    #[display("invalid database configuration: {_0}")]
    InvalidConfig(#[error(not(source))] String),
    /// Binary content could not be materialised, or a read transaction failed.
    #[display("could not read media")]
    Read,
    /// The upsert transaction was rejected.
    #[display("could not write media")]
    Write,
    /// The delete transaction was rejected.
    #[display("could not delete media")]
    Delete,
    /// The record collection does not exist (schema not created yet).
    #[display("collection not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A stored row could not be converted back into a record.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// Quota estimation is not available.
    #[display("storage estimation unsupported: {_0}")]
    Unsupported(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Open | Self::Read | Self::Write | Self::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound("media".to_string()).to_string(), "collection not found: media");
        assert_eq!(
            ErrorKind::VersionConflict { stored: 3, requested: 1 }.to_string(),
            "database version conflict: stored version 3 is newer than requested version 1"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Write.is_retryable());
        assert!(!ErrorKind::InvalidConfig("version".to_string()).is_retryable());
        assert!(!ErrorKind::Unsupported("in-memory".to_string()).is_retryable());
    }

    #[test]
    fn error_from_result() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let err: Result<()> = result.or_raise(|| ErrorKind::Read);
        assert_eq!(*err.unwrap_err(), ErrorKind::Read);
    }
}
