//! Read interface over the authoritative ledger.

use async_trait::async_trait;
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};

use super::entry::{LedgerEntry, SequencedEntry};
use super::error::StoreError;

/// Authoritative queries against the append-only ledger.
///
/// Implemented by the Postgres repository in `ledgerview-db` and by
/// [`InMemoryLedgerStore`](super::InMemoryLedgerStore) for tests and local runs.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns the highest assigned sequence id, or [`SequenceId::ZERO`] for an
    /// empty ledger.
    async fn max_sequence_id(&self) -> Result<SequenceId, StoreError>;

    /// Returns every entry with a sequence id strictly greater than `after`,
    /// ascending by sequence id.
    async fn entries_after(&self, after: SequenceId) -> Result<Vec<SequencedEntry>, StoreError>;

    /// Sums credits minus debits for `account` within `route` over the full
    /// ledger. Accounts with no entries have a balance of zero.
    async fn aggregate_balance(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
    ) -> Result<i64, StoreError>;

    /// Returns entries touching `account` within `route`, newest first.
    ///
    /// `limit` caps the number of rows; `None` returns the full history.
    async fn history_for(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>, StoreError>;
}
