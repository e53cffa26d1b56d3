//! Loading cache error types.

use std::time::Duration;

use thiserror::Error;

use crate::ledger::StoreError;

/// Failure of an authoritative load behind [`LoadingCache::get`](super::LoadingCache::get).
///
/// Every caller waiting on the same in-flight load receives a clone of the
/// same error. Errors are never stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The loader's store query failed.
    #[error("Authoritative load failed: {0}")]
    Store(#[from] StoreError),

    /// The loader did not finish before the configured deadline.
    #[error("Authoritative load timed out after {0:?}")]
    Timeout(Duration),
}
