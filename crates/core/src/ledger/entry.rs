//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use serde::{Deserialize, Serialize};

/// A single transfer recorded in the ledger.
///
/// Entries are immutable once appended. The amount is expressed in minor
/// currency units (cents) and is always positive; direction comes from the
/// from/to sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Account being debited.
    pub from_account: AccountNumber,
    /// Routing number of the debited account.
    pub from_route: RoutingNumber,
    /// Account being credited.
    pub to_account: AccountNumber,
    /// Routing number of the credited account.
    pub to_route: RoutingNumber,
    /// Amount in minor units.
    pub amount: i64,
    /// When the transfer was posted.
    pub posted_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed effect of this entry on `account` within `route`.
    ///
    /// Credits are positive, debits negative. A transfer from an account to
    /// itself nets to zero. Returns `None` on overflow.
    #[must_use]
    pub fn net_effect(&self, account: &AccountNumber, route: &RoutingNumber) -> Option<i64> {
        let mut delta: i64 = 0;
        if self.is_debit_of(account, route) {
            delta = delta.checked_sub(self.amount)?;
        }
        if self.is_credit_to(account, route) {
            delta = delta.checked_add(self.amount)?;
        }
        Some(delta)
    }

    /// True if this entry debits `account` in `route`.
    #[must_use]
    pub fn is_debit_of(&self, account: &AccountNumber, route: &RoutingNumber) -> bool {
        &self.from_account == account && &self.from_route == route
    }

    /// True if this entry credits `account` in `route`.
    #[must_use]
    pub fn is_credit_to(&self, account: &AccountNumber, route: &RoutingNumber) -> bool {
        &self.to_account == account && &self.to_route == route
    }

    /// True if either side of this entry is `account` in `route`.
    #[must_use]
    pub fn touches(&self, account: &AccountNumber, route: &RoutingNumber) -> bool {
        self.is_debit_of(account, route) || self.is_credit_to(account, route)
    }
}

/// A ledger entry together with the sequence id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEntry {
    /// Position in the ledger.
    pub sequence_id: SequenceId,
    /// The entry itself.
    #[serde(flatten)]
    pub entry: LedgerEntry,
}
