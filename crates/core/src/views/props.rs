//! Property tests: cached views agree with the store.

use std::sync::Arc;
use std::time::Duration;

use ledgerview_shared::types::{AccountNumber, RoutingNumber};
use proptest::prelude::*;

use super::{BalanceView, HistoryView};
use crate::cache::CacheConfig;
use crate::ledger::testutil::{FOREIGN, LOCAL, routed};
use crate::ledger::{InMemoryLedgerStore, LedgerStore};
use crate::reader::LedgerReader;

const ACCOUNTS: [&str; 4] = ["1", "2", "3", "4"];
const HISTORY_LIMIT: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Append {
        from: usize,
        from_local: bool,
        to: usize,
        to_local: bool,
        amount: i64,
    },
    Lookup(usize),
    Invalidate(usize),
    Poll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..ACCOUNTS.len(), prop::bool::weighted(0.8), 0..ACCOUNTS.len(), prop::bool::weighted(0.8), 1i64..1_000)
            .prop_map(|(from, from_local, to, to_local, amount)| Op::Append {
                from,
                from_local,
                to,
                to_local,
                amount,
            }),
        3 => (0..ACCOUNTS.len()).prop_map(Op::Lookup),
        1 => (0..ACCOUNTS.len()).prop_map(Op::Invalidate),
        2 => Just(Op::Poll),
    ]
}

const fn route(local: bool) -> &'static str {
    if local { LOCAL } else { FOREIGN }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever interleaving of appends, lookups, evictions and polls
    /// happens, once the reader has caught up every cached balance equals the
    /// store aggregate and every cached history equals the store's most
    /// recent entries, with nothing extra and nothing missing.
    #[test]
    fn prop_cached_views_match_store(
        ops in prop::collection::vec(op_strategy(), 1..60),
        max_size in 1u64..5,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = InMemoryLedgerStore::new();
            let shared: Arc<dyn LedgerStore> = Arc::new(store.clone());
            let local = RoutingNumber::from(LOCAL);
            let balances = BalanceView::new(Arc::clone(&shared), local.clone(), CacheConfig::new(max_size));
            let history = HistoryView::new(
                Arc::clone(&shared),
                local.clone(),
                HISTORY_LIMIT,
                CacheConfig::new(max_size),
            );
            let mut reader = LedgerReader::new(shared, Duration::from_millis(10))
                .with_observer(Arc::new(balances.clone()))
                .with_observer(Arc::new(history.clone()));
            reader.poll().await.unwrap();

            for op in ops {
                match op {
                    Op::Append { from, from_local, to, to_local, amount } => {
                        store.append(routed(
                            ACCOUNTS[from],
                            route(from_local),
                            ACCOUNTS[to],
                            route(to_local),
                            amount,
                        ));
                    }
                    Op::Lookup(i) => {
                        let account = AccountNumber::from(ACCOUNTS[i]);
                        balances.get_balance(&account).await.unwrap();
                        let loaded = history.get_history(&account).await.unwrap();
                        prop_assert!(loaded.len() <= HISTORY_LIMIT);
                    }
                    Op::Invalidate(i) => {
                        let account = AccountNumber::from(ACCOUNTS[i]);
                        balances.invalidate(&account).await;
                        history.invalidate(&account).await;
                    }
                    Op::Poll => {
                        reader.poll().await.unwrap();
                    }
                }
            }

            reader.poll().await.unwrap();

            for number in ACCOUNTS {
                let account = AccountNumber::from(number);
                if let Some(cached) = balances.cached_balance(&account).await {
                    let expected = store.aggregate_balance(&account, &local).await.unwrap();
                    prop_assert_eq!(cached, expected, "balance of {}", number);
                }
                if let Some(cached) = history.cached_history(&account).await {
                    let expected = store
                        .history_for(&account, &local, Some(HISTORY_LIMIT))
                        .await
                        .unwrap();
                    prop_assert!(cached.len() <= HISTORY_LIMIT);
                    prop_assert_eq!(&*cached, &expected, "history of {}", number);
                }
            }
            Ok(())
        })?;
    }
}
