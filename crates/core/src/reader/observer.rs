//! Observer interface for newly discovered ledger entries.

use async_trait::async_trait;
use ledgerview_shared::types::{AccountNumber, SequenceId};
use thiserror::Error;

use crate::ledger::SequencedEntry;

/// Failure applying one ledger entry to a derived view.
///
/// The reader logs these and moves on: the cursor still advances and the
/// remaining observers still run. The affected cache entry is left to heal
/// on its next authoritative load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// Applying the entry would overflow the cached balance.
    #[error("Balance of account {account} overflows applying {delta}")]
    BalanceOverflow {
        /// Account whose balance was being updated.
        account: AccountNumber,
        /// Signed change that could not be applied.
        delta: i64,
    },

    /// The entry cannot be applied as recorded.
    #[error("Rejected ledger entry {sequence_id}: {reason}")]
    InvalidEntry {
        /// Sequence id of the rejected entry.
        sequence_id: SequenceId,
        /// Why it was rejected.
        reason: String,
    },
}

/// Handler invoked once per newly discovered ledger entry, in ledger order.
#[async_trait]
pub trait LedgerObserver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Applies `entry` to whatever this observer maintains.
    async fn on_entry(&self, entry: &SequencedEntry) -> Result<(), ObserverError>;
}
