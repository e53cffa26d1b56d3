//! Cached transaction histories.

use std::sync::Arc;

use async_trait::async_trait;
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use tracing::debug;

use super::error::LookupError;
use super::local_accounts;
use super::snapshot::{Snapshot, load_snapshot};
use crate::cache::{CacheConfig, LoadingCache};
use crate::ledger::{LedgerEntry, LedgerStore, SequencedEntry};
use crate::reader::{LedgerObserver, ObserverError};

/// Shared, newest-first list of entries touching one account.
pub type History = Arc<Vec<LedgerEntry>>;

/// History cache for accounts in the local routing domain.
///
/// Loads fetch every entry touching the account, newest first, and reads
/// return at most `history_limit` of them. New entries are prepended to lists
/// that are already cached and the oldest entries fall off the end.
#[derive(Clone)]
pub struct HistoryView {
    cache: LoadingCache<AccountNumber, Snapshot<History>>,
    local_route: RoutingNumber,
    history_limit: usize,
}

impl HistoryView {
    /// Creates a view that loads histories from `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        local_route: RoutingNumber,
        history_limit: usize,
        config: CacheConfig,
    ) -> Self {
        let route = local_route.clone();
        let cache = LoadingCache::new("history", config, move |account: AccountNumber| {
            let store = Arc::clone(&store);
            let route = route.clone();
            async move {
                let snapshot =
                    load_snapshot(store.as_ref(), || store.history_for(&account, &route, None))
                        .await?;
                Ok(Snapshot {
                    value: Arc::new(snapshot.value),
                    as_of: snapshot.as_of,
                })
            }
        });

        Self {
            cache,
            local_route,
            history_limit,
        }
    }

    /// Maximum number of entries returned per account.
    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Returns the most recent entries touching `account`, newest first.
    #[tracing::instrument(skip(self), fields(account = %account))]
    pub async fn get_history(&self, account: &AccountNumber) -> Result<History, LookupError> {
        self.cache
            .get(account)
            .await
            .map(|snapshot| self.bounded(snapshot.value))
            .map_err(|source| LookupError::History {
                account: account.clone(),
                source,
            })
    }

    /// Returns the history only if it is already cached.
    pub async fn cached_history(&self, account: &AccountNumber) -> Option<History> {
        self.cache
            .get_if_present(account)
            .await
            .map(|snapshot| self.bounded(snapshot.value))
    }

    fn bounded(&self, history: History) -> History {
        if history.len() <= self.history_limit {
            return history;
        }
        Arc::new(history[..self.history_limit].to_vec())
    }

    /// Drops the cached history so the next lookup reloads it.
    pub async fn invalidate(&self, account: &AccountNumber) {
        self.cache.invalidate(account).await;
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &LoadingCache<AccountNumber, Snapshot<History>> {
        &self.cache
    }

    /// Prepends one ledger entry to the cached histories it touches.
    ///
    /// A transfer between two sides of the same local account is recorded
    /// once.
    pub async fn apply(&self, sequenced: &SequencedEntry) -> Result<(), ObserverError> {
        let entry = &sequenced.entry;
        if entry.amount <= 0 {
            return Err(ObserverError::InvalidEntry {
                sequence_id: sequenced.sequence_id,
                reason: format!("non-positive amount {}", entry.amount),
            });
        }

        for account in local_accounts(entry, &self.local_route) {
            self.prepend(account, entry, sequenced.sequence_id).await;
        }
        Ok(())
    }

    async fn prepend(&self, account: &AccountNumber, entry: &LedgerEntry, sequence_id: SequenceId) {
        let Some(current) = self.cache.get_if_present(account).await else {
            return;
        };
        if current.covers(sequence_id) {
            debug!(%account, %sequence_id, as_of = %current.as_of, "history already contains entry");
            return;
        }

        let mut entries = Vec::with_capacity(current.value.len() + 1);
        entries.push(entry.clone());
        entries.extend(current.value.iter().take(self.history_limit).cloned());
        let dropped = entries.len().saturating_sub(self.history_limit);
        entries.truncate(self.history_limit);

        self.cache
            .put(
                account.clone(),
                Snapshot {
                    value: Arc::new(entries),
                    as_of: sequence_id,
                },
            )
            .await;
        debug!(%account, %sequence_id, dropped, "prepended ledger entry to cached history");
    }
}

#[async_trait]
impl LedgerObserver for HistoryView {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn on_entry(&self, entry: &SequencedEntry) -> Result<(), ObserverError> {
        self.apply(entry).await
    }
}
