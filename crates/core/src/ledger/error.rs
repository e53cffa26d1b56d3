//! Ledger store error types.

use thiserror::Error;

/// Errors raised by a ledger store adapter.
///
/// Always surfaced to the caller; adapters never retry inline. `Clone` so a
/// single failed load can be handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),

    /// A query was rejected or failed while executing.
    #[error("Ledger query failed: {0}")]
    Query(String),

    /// The store returned a row that cannot be represented.
    #[error("Ledger returned invalid data: {0}")]
    InvalidData(String),

    /// The ledger head moved during every attempt at a consistent read.
    #[error("Ledger head kept moving across {0} read attempts")]
    HeadMoving(u32),
}

impl StoreError {
    /// Returns the error code for API responses and logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Query(_) => "STORE_QUERY_FAILED",
            Self::InvalidData(_) => "STORE_INVALID_DATA",
            Self::HeadMoving(_) => "STORE_HEAD_MOVING",
        }
    }
}
