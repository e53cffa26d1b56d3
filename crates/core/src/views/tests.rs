//! Tests for the balance and history views, alone and fed by the reader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use rstest::rstest;

use super::*;
use crate::cache::{CacheConfig, LoadError};
use crate::ledger::testutil::{FOREIGN, LOCAL, routed, transfer};
use crate::ledger::{InMemoryLedgerStore, LedgerEntry, LedgerStore, SequencedEntry, StoreError};
use crate::reader::{LedgerReader, ObserverError};

fn acct(number: &str) -> AccountNumber {
    AccountNumber::from(number)
}

fn balances(store: &InMemoryLedgerStore, config: CacheConfig) -> BalanceView {
    BalanceView::new(Arc::new(store.clone()), RoutingNumber::from(LOCAL), config)
}

fn histories(store: &InMemoryLedgerStore, limit: usize, config: CacheConfig) -> HistoryView {
    HistoryView::new(
        Arc::new(store.clone()),
        RoutingNumber::from(LOCAL),
        limit,
        config,
    )
}

fn reader(store: &InMemoryLedgerStore, balances: &BalanceView, history: &HistoryView) -> LedgerReader {
    LedgerReader::new(Arc::new(store.clone()), Duration::from_millis(10))
        .with_observer(Arc::new(balances.clone()))
        .with_observer(Arc::new(history.clone()))
}

fn sequenced(id: i64, entry: LedgerEntry) -> SequencedEntry {
    SequencedEntry {
        sequence_id: SequenceId(id),
        entry,
    }
}

#[tokio::test]
async fn test_cached_balance_follows_new_entries_without_reloading() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();

    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 100);
    assert_eq!(store.balance_queries(), 1);

    store.append(transfer("1", "2", 30));
    reader.poll().await.unwrap();

    assert_eq!(balances.cached_balance(&acct("1")).await, Some(70));
    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 70);
    assert_eq!(store.balance_queries(), 1);
}

#[tokio::test]
async fn test_uncached_account_is_not_created_and_loads_fresh() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();

    store.append(transfer("1", "2", 30));
    reader.poll().await.unwrap();

    assert_eq!(balances.cached_balance(&acct("1")).await, None);
    assert_eq!(balances.cached_balance(&acct("2")).await, None);
    assert!(history.cached_history(&acct("1")).await.is_none());
    assert_eq!(store.balance_queries(), 0);

    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 70);
    assert_eq!(balances.get_balance(&acct("2")).await.unwrap(), 30);
}

#[tokio::test]
async fn test_evicted_account_reloads_with_entries_it_missed() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    store.append(transfer("9", "2", 50));
    let balances = balances(&store, CacheConfig::new(1));
    let history = histories(&store, 10, CacheConfig::new(1));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();

    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 100);
    assert_eq!(balances.get_balance(&acct("2")).await.unwrap(), 50);
    balances.cache().run_pending_tasks().await;
    assert_eq!(balances.cache().entry_count(), 1);
    assert_eq!(balances.cached_balance(&acct("1")).await, None);

    store.append(transfer("1", "3", 25));
    reader.poll().await.unwrap();
    assert_eq!(balances.cached_balance(&acct("1")).await, None);

    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 75);
    assert_eq!(store.balance_queries(), 3);
}

#[tokio::test]
async fn test_entry_already_in_load_is_applied_once() {
    let store = InMemoryLedgerStore::new();
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();

    // Lands in the store before the load, dispatched after it.
    store.append(transfer("9", "1", 40));
    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 40);
    assert_eq!(history.get_history(&acct("1")).await.unwrap().len(), 1);

    reader.poll().await.unwrap();

    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 40);
    assert_eq!(history.get_history(&acct("1")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_redelivered_entry_is_a_no_op() {
    let store = InMemoryLedgerStore::new();
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    balances.get_balance(&acct("1")).await.unwrap();
    history.get_history(&acct("1")).await.unwrap();

    let entry = sequenced(1, transfer("9", "1", 15));
    for _ in 0..2 {
        balances.apply(&entry).await.unwrap();
        history.apply(&entry).await.unwrap();
    }

    assert_eq!(balances.cached_balance(&acct("1")).await, Some(15));
    assert_eq!(history.cached_history(&acct("1")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_transfer_nets_zero_and_is_listed_once() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();
    balances.get_balance(&acct("1")).await.unwrap();
    history.get_history(&acct("1")).await.unwrap();

    store.append(transfer("1", "1", 60));
    reader.poll().await.unwrap();

    assert_eq!(balances.cached_balance(&acct("1")).await, Some(100));
    let cached = history.cached_history(&acct("1")).await.unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0].amount, 60);
    assert_eq!(
        *cached,
        store.history_for(&acct("1"), &LOCAL.into(), Some(10)).await.unwrap()
    );
}

#[rstest]
#[case::debit_to_foreign(routed("1", LOCAL, "2", FOREIGN, 20), 80, 0)]
#[case::credit_from_foreign(routed("2", FOREIGN, "1", LOCAL, 20), 120, 0)]
#[case::same_number_in_foreign_route(routed("1", FOREIGN, "2", LOCAL, 20), 100, 20)]
#[case::both_foreign(routed("1", FOREIGN, "2", FOREIGN, 20), 100, 0)]
#[tokio::test]
async fn test_only_local_route_is_affected(
    #[case] entry: crate::ledger::LedgerEntry,
    #[case] expected_one: i64,
    #[case] expected_two: i64,
) {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    let balances = balances(&store, CacheConfig::new(100));
    balances.get_balance(&acct("1")).await.unwrap();
    balances.get_balance(&acct("2")).await.unwrap();

    balances.apply(&sequenced(5, entry)).await.unwrap();

    assert_eq!(balances.cached_balance(&acct("1")).await, Some(expected_one));
    assert_eq!(balances.cached_balance(&acct("2")).await, Some(expected_two));
}

#[tokio::test]
async fn test_history_is_bounded_and_newest_first() {
    let store = InMemoryLedgerStore::new();
    for amount in 1..=3 {
        store.append(transfer("9", "1", amount));
    }
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 3, CacheConfig::new(100));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();

    let loaded = history.get_history(&acct("1")).await.unwrap();
    assert_eq!(loaded.iter().map(|e| e.amount).collect::<Vec<_>>(), vec![3, 2, 1]);

    store.append(transfer("1", "2", 4));
    store.append(transfer("9", "1", 5));
    reader.poll().await.unwrap();

    let cached = history.cached_history(&acct("1")).await.unwrap();
    assert_eq!(cached.iter().map(|e| e.amount).collect::<Vec<_>>(), vec![5, 4, 3]);
    assert_eq!(store.history_queries(), 1);
}

#[tokio::test]
async fn test_history_reads_apply_limit_to_full_load() {
    let store = InMemoryLedgerStore::new();
    for amount in 1..=5 {
        store.append(transfer("1", "2", amount));
    }
    let history = histories(&store, 2, CacheConfig::new(100));

    let loaded = history.get_history(&acct("2")).await.unwrap();
    assert_eq!(loaded.iter().map(|e| e.amount).collect::<Vec<_>>(), vec![5, 4]);
    assert_eq!(history.history_limit(), 2);

    // The load keeps everything; only reads are cut to the limit.
    let stored = history.cache().get_if_present(&acct("2")).await.unwrap();
    assert_eq!(stored.value.len(), 5);
    let cached = history.cached_history(&acct("2")).await.unwrap();
    assert_eq!(cached.len(), 2);

    history.apply(&sequenced(6, transfer("1", "2", 6))).await.unwrap();
    let loaded = history.get_history(&acct("2")).await.unwrap();
    assert_eq!(loaded.iter().map(|e| e.amount).collect::<Vec<_>>(), vec![6, 5]);
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_load() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    store.set_latency(Some(Duration::from_millis(30)));
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));

    let account = acct("1");
    let lookups = (0..12).map(|_| balances.get_balance(&account));
    let results = join_all(lookups).await;
    assert!(results.iter().all(|r| r.as_ref().ok() == Some(&100)));
    assert_eq!(store.balance_queries(), 1);

    let lookups = (0..12).map(|_| history.get_history(&account));
    let results = join_all(lookups).await;
    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|h| h.len() == 1)));
    assert_eq!(store.history_queries(), 1);
}

#[tokio::test]
async fn test_failed_load_is_reported_and_not_cached() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    let failure = StoreError::Unavailable("connection reset".into());
    store.set_failure(Some(failure.clone()));

    let err = balances.get_balance(&acct("1")).await.unwrap_err();
    assert_eq!(
        err,
        LookupError::Balance {
            account: acct("1"),
            source: LoadError::Store(failure.clone()),
        }
    );
    assert!(!err.is_timeout());

    let err = history.get_history(&acct("1")).await.unwrap_err();
    assert!(matches!(err, LookupError::History { .. }));
    assert_eq!(err.load_error(), &LoadError::Store(failure));

    assert_eq!(balances.cached_balance(&acct("1")).await, None);
    store.set_failure(None);
    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), 100);
}

#[tokio::test]
async fn test_slow_load_times_out() {
    let store = InMemoryLedgerStore::new();
    store.set_latency(Some(Duration::from_millis(200)));
    let config = CacheConfig::new(100).with_load_timeout(Duration::from_millis(20));
    let balances = balances(&store, config);

    let err = balances.get_balance(&acct("1")).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(balances.cached_balance(&acct("1")).await, None);
}

#[tokio::test]
async fn test_non_positive_amount_is_rejected() {
    let store = InMemoryLedgerStore::new();
    let balances = balances(&store, CacheConfig::new(100));
    let history = histories(&store, 10, CacheConfig::new(100));
    balances.get_balance(&acct("1")).await.unwrap();

    let entry = sequenced(3, transfer("9", "1", 0));
    assert!(matches!(
        balances.apply(&entry).await,
        Err(ObserverError::InvalidEntry { sequence_id: SequenceId(3), .. })
    ));
    assert!(history.apply(&entry).await.is_err());
    assert_eq!(balances.cached_balance(&acct("1")).await, Some(0));
}

#[tokio::test]
async fn test_overflow_leaves_balance_untouched() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", i64::MAX));
    let balances = balances(&store, CacheConfig::new(100));
    balances.get_balance(&acct("1")).await.unwrap();
    balances.get_balance(&acct("2")).await.unwrap();

    let result = balances.apply(&sequenced(2, transfer("2", "1", 1))).await;

    assert_eq!(
        result,
        Err(ObserverError::BalanceOverflow {
            account: acct("1"),
            delta: 1,
        })
    );
    assert_eq!(balances.cached_balance(&acct("1")).await, Some(i64::MAX));
    // The other side still applies.
    assert_eq!(balances.cached_balance(&acct("2")).await, Some(-1));
}

#[tokio::test]
async fn test_payment_to_other_bank_debits_cached_balance() {
    let store = InMemoryLedgerStore::new();
    store.append(routed("5555555555", "808889588", "1011226111", LOCAL, 100));
    let balances = balances(&store, CacheConfig::new(100));
    assert_eq!(balances.get_balance(&acct("1011226111")).await.unwrap(), 100);

    let payment = routed("1011226111", LOCAL, "7777777777", "808889588", 30);
    balances.apply(&sequenced(2, payment)).await.unwrap();

    assert_eq!(balances.cached_balance(&acct("1011226111")).await, Some(70));
    assert_eq!(balances.cached_balance(&acct("7777777777")).await, None);
}

#[tokio::test]
async fn test_concurrent_lookups_evict_and_evicted_account_reloads() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    store.append(transfer("9", "2", 50));
    let balances = balances(&store, CacheConfig::new(1));
    let history = histories(&store, 10, CacheConfig::new(1));
    let mut reader = reader(&store, &balances, &history);
    reader.poll().await.unwrap();
    store.set_latency(Some(Duration::from_millis(20)));

    let (acct_1, acct_2) = (acct("1"), acct("2"));
    let (first, second) = tokio::join!(
        balances.get_balance(&acct_1),
        balances.get_balance(&acct_2),
    );
    assert_eq!(first.unwrap(), 100);
    assert_eq!(second.unwrap(), 50);
    balances.cache().run_pending_tasks().await;
    assert_eq!(balances.cache().entry_count(), 1);
    assert_eq!(store.balance_queries(), 2);

    let (evicted, expected) = if balances.cached_balance(&acct("1")).await.is_none() {
        (acct("1"), 75)
    } else {
        (acct("2"), 25)
    };
    assert_eq!(balances.cached_balance(&evicted).await, None);

    store.set_latency(None);
    store.append(transfer(evicted.as_str(), "3", 25));
    reader.poll().await.unwrap();
    assert_eq!(balances.cached_balance(&evicted).await, None);

    assert_eq!(balances.get_balance(&evicted).await.unwrap(), expected);
    assert_eq!(store.balance_queries(), 3);
}

/// Appends a credit to account 1 ahead of every view query while churning,
/// so the ledger head never stays put across a load.
#[derive(Clone)]
struct ChurningStore {
    inner: InMemoryLedgerStore,
    churning: Arc<AtomicBool>,
}

impl ChurningStore {
    fn churn(&self) {
        if self.churning.load(Ordering::SeqCst) {
            self.inner.append(transfer("9", "1", 10));
        }
    }
}

#[async_trait]
impl LedgerStore for ChurningStore {
    async fn max_sequence_id(&self) -> Result<SequenceId, StoreError> {
        self.inner.max_sequence_id().await
    }

    async fn entries_after(&self, after: SequenceId) -> Result<Vec<SequencedEntry>, StoreError> {
        self.inner.entries_after(after).await
    }

    async fn aggregate_balance(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
    ) -> Result<i64, StoreError> {
        self.churn();
        self.inner.aggregate_balance(account, route).await
    }

    async fn history_for(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.churn();
        self.inner.history_for(account, route, limit).await
    }
}

#[tokio::test]
async fn test_load_racing_a_busy_ledger_is_not_cached() {
    let store = InMemoryLedgerStore::new();
    store.append(transfer("9", "1", 100));
    let churning = ChurningStore {
        inner: store.clone(),
        churning: Arc::new(AtomicBool::new(true)),
    };
    let shared: Arc<dyn LedgerStore> = Arc::new(churning.clone());
    let local = RoutingNumber::from(LOCAL);
    let balances = BalanceView::new(Arc::clone(&shared), local.clone(), CacheConfig::new(100));
    let history = HistoryView::new(shared, local.clone(), 10, CacheConfig::new(100));
    let mut reader = reader(&store, &balances, &history);

    let err = balances.get_balance(&acct("1")).await.unwrap_err();
    assert_eq!(err.load_error(), &LoadError::Store(StoreError::HeadMoving(3)));
    let err = history.get_history(&acct("1")).await.unwrap_err();
    assert_eq!(err.load_error(), &LoadError::Store(StoreError::HeadMoving(3)));
    assert_eq!(balances.cached_balance(&acct("1")).await, None);
    assert!(history.cached_history(&acct("1")).await.is_none());

    churning.churning.store(false, Ordering::SeqCst);
    let truth = store.aggregate_balance(&acct("1"), &local).await.unwrap();
    assert_eq!(truth, 160);
    assert_eq!(balances.get_balance(&acct("1")).await.unwrap(), truth);
    assert_eq!(history.get_history(&acct("1")).await.unwrap().len(), 7);

    // Every credit appended during the failed loads is already in the cache.
    reader.poll().await.unwrap();
    assert_eq!(balances.cached_balance(&acct("1")).await, Some(truth));
    assert_eq!(history.cached_history(&acct("1")).await.unwrap().len(), 7);
}
