//! Per-account views derived from the ledger.
//!
//! Both views load from the store on a cache miss and are then kept current
//! by the ledger reader, which feeds them every newly observed entry. Only
//! accounts in the local routing domain are ever affected.

mod balance;
mod error;
mod history;
mod snapshot;

#[cfg(test)]
mod props;
#[cfg(test)]
mod tests;

pub use balance::BalanceView;
pub use error::LookupError;
pub use history::{History, HistoryView};
pub use snapshot::Snapshot;

use ledgerview_shared::types::{AccountNumber, RoutingNumber};

use crate::ledger::LedgerEntry;

/// Distinct accounts of `entry` that live in `route`, debit side first.
fn local_accounts<'a>(entry: &'a LedgerEntry, route: &RoutingNumber) -> Vec<&'a AccountNumber> {
    let mut accounts = Vec::with_capacity(2);
    if &entry.from_route == route {
        accounts.push(&entry.from_account);
    }
    if &entry.to_route == route && !entry.is_debit_of(&entry.to_account, route) {
        accounts.push(&entry.to_account);
    }
    accounts
}
