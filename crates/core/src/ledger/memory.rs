//! In-memory ledger store.
//!
//! [`InMemoryLedgerStore`] implements [`LedgerStore`] over a vector of
//! sequenced entries. It backs the unit tests and local runs without Postgres,
//! and supports failure and latency injection so reader and cache behaviour can
//! be exercised against an unhealthy store.
//!
//! Cloning is cheap; all clones share the same ledger.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use parking_lot::RwLock;

use super::entry::{LedgerEntry, SequencedEntry};
use super::error::StoreError;
use super::store::LedgerStore;

#[derive(Default)]
struct Inner {
    entries: Vec<SequencedEntry>,
    next_id: i64,
    failure: Option<StoreError>,
    latency: Option<Duration>,
}

/// Append-only ledger held in memory.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<Inner>>,
    balance_queries: Arc<AtomicU64>,
    history_queries: Arc<AtomicU64>,
}

impl InMemoryLedgerStore {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns the sequence id assigned to it.
    pub fn append(&self, entry: LedgerEntry) -> SequenceId {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let sequence_id = SequenceId(inner.next_id);
        inner.entries.push(SequencedEntry { sequence_id, entry });
        sequence_id
    }

    /// Burns `count` sequence values without appending, the way a rolled-back
    /// insert leaves a gap in a database sequence.
    pub fn skip_sequence(&self, count: i64) {
        self.inner.write().next_id += count;
    }

    /// Makes every subsequent query fail with `failure`, or clears the failure.
    pub fn set_failure(&self, failure: Option<StoreError>) {
        self.inner.write().failure = failure;
    }

    /// Delays every subsequent query by `latency`, or clears the delay.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.inner.write().latency = latency;
    }

    /// Number of `aggregate_balance` queries served so far.
    #[must_use]
    pub fn balance_queries(&self) -> u64 {
        self.balance_queries.load(Ordering::SeqCst)
    }

    /// Number of `history_for` queries served so far.
    #[must_use]
    pub fn history_queries(&self) -> u64 {
        self.history_queries.load(Ordering::SeqCst)
    }

    /// Number of entries in the ledger.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// True if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn check(&self) -> Result<(), StoreError> {
        let (failure, latency) = {
            let inner = self.inner.read();
            (inner.failure.clone(), inner.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn max_sequence_id(&self) -> Result<SequenceId, StoreError> {
        self.check().await?;
        let inner = self.inner.read();
        Ok(inner
            .entries
            .last()
            .map_or(SequenceId::ZERO, |e| e.sequence_id))
    }

    async fn entries_after(&self, after: SequenceId) -> Result<Vec<SequencedEntry>, StoreError> {
        self.check().await?;
        let inner = self.inner.read();
        // Appends are sequential so entries are already ascending.
        let start = inner.entries.partition_point(|e| e.sequence_id <= after);
        Ok(inner.entries[start..].to_vec())
    }

    async fn aggregate_balance(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
    ) -> Result<i64, StoreError> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        let inner = self.inner.read();
        inner.entries.iter().try_fold(0i64, |total, e| {
            e.entry
                .net_effect(account, route)
                .and_then(|delta| total.checked_add(delta))
                .ok_or_else(|| {
                    StoreError::InvalidData(format!("balance of account {account} overflows"))
                })
        })
    }

    async fn history_for(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.history_queries.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        let inner = self.inner.read();
        let matching = inner
            .entries
            .iter()
            .rev()
            .filter(|e| e.entry.touches(account, route))
            .map(|e| e.entry.clone());
        Ok(match limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }
}
