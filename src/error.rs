//! Service Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. The HTTP layer maps each kind onto a status code.

use derive_more::{Display, Error};

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nothing matched the request. Surfaced as 404.
    #[display("Asset not found")]
    NotFound,
    /// Request parameters were rejected before reaching the store. Surfaced
    /// as 422.
    #[display("{_0}")]
    Validation(#[error(not(source))] String),
    #[display("asset store error")]
    Store,
    #[display("storage inspection error")]
    Inspect,
    #[display("server error")]
    Server,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store | Self::Inspect)
    }

    /// Returns `true` if the client is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound | Self::Validation(_))
    }
}
