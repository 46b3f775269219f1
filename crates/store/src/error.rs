//! Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// Only SQLite (`sqlite:`) connection strings are supported.
    #[display("unsupported database connection string (only `sqlite:` URLs are supported): {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// A write would break the uniqueness of `kuid` or `file_id`.
    #[display("constraint violation")]
    Constraint,
    /// The key does not match `kuid:<a>:<b>` or `kuid2:<a>:<b>:<c>`.
    #[display("invalid kuid: {_0}")]
    InvalidKuid(#[error(not(source))] String),
    /// File identifiers are exactly 32 characters long.
    #[display("invalid file id: {_0}")]
    InvalidFileId(#[error(not(source))] String),
    #[display("invalid asset data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }

    /// Returns `true` if the error was caused by caller input rather than
    /// the state of the database.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidKuid(_) | Self::InvalidFileId(_))
    }
}

/// Classify a failed write: unique index violations are surfaced as
/// [`ErrorKind::Constraint`], everything else is a plain database error.
pub(crate) fn classify_write(err: &sqlx::Error) -> ErrorKind {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() || db.is_check_violation() => ErrorKind::Constraint,
        _ => ErrorKind::Database,
    }
}
