//! Lookup error types for derived views.

use ledgerview_shared::types::AccountNumber;
use thiserror::Error;

use crate::cache::LoadError;

/// Failure to serve a derived value because its authoritative load failed.
///
/// Only the callers waiting on that account's load see this; the account
/// stays uncached and the next lookup retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Loading a balance failed.
    #[error("Failed to load balance for account {account}: {source}")]
    Balance {
        /// Account being looked up.
        account: AccountNumber,
        /// Underlying load failure.
        source: LoadError,
    },

    /// Loading a transaction history failed.
    #[error("Failed to load history for account {account}: {source}")]
    History {
        /// Account being looked up.
        account: AccountNumber,
        /// Underlying load failure.
        source: LoadError,
    },
}

impl LookupError {
    /// The load failure behind this error.
    #[must_use]
    pub const fn load_error(&self) -> &LoadError {
        match self {
            Self::Balance { source, .. } | Self::History { source, .. } => source,
        }
    }

    /// True if the load hit its deadline rather than failing outright.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.load_error(), LoadError::Timeout(_))
    }
}
