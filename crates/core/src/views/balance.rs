//! Cached account balances.
//!
//! Balances load with a full aggregate over the ledger and are then kept
//! current by applying each newly observed entry to accounts already in the
//! cache. Accounts that are not cached are never created by the observer.

use std::sync::Arc;

use async_trait::async_trait;
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use tracing::debug;

use super::error::LookupError;
use super::local_accounts;
use super::snapshot::{Snapshot, load_snapshot};
use crate::cache::{CacheConfig, LoadingCache};
use crate::ledger::{LedgerStore, SequencedEntry};
use crate::reader::{LedgerObserver, ObserverError};

/// Balance cache for accounts in the local routing domain.
#[derive(Clone)]
pub struct BalanceView {
    cache: LoadingCache<AccountNumber, Snapshot<i64>>,
    local_route: RoutingNumber,
}

impl BalanceView {
    /// Creates a view that loads balances from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, local_route: RoutingNumber, config: CacheConfig) -> Self {
        let route = local_route.clone();
        let cache = LoadingCache::new("balances", config, move |account: AccountNumber| {
            let store = Arc::clone(&store);
            let route = route.clone();
            async move {
                load_snapshot(store.as_ref(), || store.aggregate_balance(&account, &route)).await
            }
        });

        Self { cache, local_route }
    }

    /// Returns the balance of `account`, loading it on a cache miss.
    #[tracing::instrument(skip(self), fields(account = %account))]
    pub async fn get_balance(&self, account: &AccountNumber) -> Result<i64, LookupError> {
        self.cache
            .get(account)
            .await
            .map(|snapshot| snapshot.value)
            .map_err(|source| LookupError::Balance {
                account: account.clone(),
                source,
            })
    }

    /// Returns the balance only if it is already cached.
    pub async fn cached_balance(&self, account: &AccountNumber) -> Option<i64> {
        self.cache
            .get_if_present(account)
            .await
            .map(|snapshot| snapshot.value)
    }

    /// Drops the cached balance so the next lookup recomputes it.
    pub async fn invalidate(&self, account: &AccountNumber) {
        self.cache.invalidate(account).await;
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &LoadingCache<AccountNumber, Snapshot<i64>> {
        &self.cache
    }

    /// Applies one ledger entry to the cached balances it touches.
    pub async fn apply(&self, sequenced: &SequencedEntry) -> Result<(), ObserverError> {
        let entry = &sequenced.entry;
        if entry.amount <= 0 {
            return Err(ObserverError::InvalidEntry {
                sequence_id: sequenced.sequence_id,
                reason: format!("non-positive amount {}", entry.amount),
            });
        }

        let mut outcome = Ok(());
        for account in local_accounts(entry, &self.local_route) {
            let Some(delta) = entry.net_effect(account, &self.local_route) else {
                outcome = outcome.and(Err(ObserverError::BalanceOverflow {
                    account: account.clone(),
                    delta: entry.amount,
                }));
                continue;
            };
            let applied = self.adjust(account, delta, sequenced.sequence_id).await;
            outcome = outcome.and(applied);
        }
        outcome
    }

    async fn adjust(
        &self,
        account: &AccountNumber,
        delta: i64,
        sequence_id: SequenceId,
    ) -> Result<(), ObserverError> {
        let Some(current) = self.cache.get_if_present(account).await else {
            return Ok(());
        };
        if current.covers(sequence_id) {
            debug!(%account, %sequence_id, as_of = %current.as_of, "balance already reflects entry");
            return Ok(());
        }

        let value = current
            .value
            .checked_add(delta)
            .ok_or_else(|| ObserverError::BalanceOverflow {
                account: account.clone(),
                delta,
            })?;
        self.cache
            .put(account.clone(), Snapshot { value, as_of: sequence_id })
            .await;
        debug!(%account, delta, balance = value, %sequence_id, "applied ledger entry to cached balance");
        Ok(())
    }
}

#[async_trait]
impl LedgerObserver for BalanceView {
    fn name(&self) -> &'static str {
        "balances"
    }

    async fn on_entry(&self, entry: &SequencedEntry) -> Result<(), ObserverError> {
        self.apply(entry).await
    }
}
