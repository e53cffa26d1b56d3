//! `SeaORM` Entity for the append-only transactions table.

use chrono::Utc;
use ledgerview_core::ledger::{LedgerEntry, SequencedEntry};
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub transaction_id: i64,
    pub from_acct: String,
    pub from_route: String,
    pub to_acct: String,
    pub to_route: String,
    pub amount: i64,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into a ledger entry without its sequence id.
    #[must_use]
    pub fn into_entry(self) -> LedgerEntry {
        LedgerEntry {
            from_account: AccountNumber::new(self.from_acct),
            from_route: RoutingNumber::new(self.from_route),
            to_account: AccountNumber::new(self.to_acct),
            to_route: RoutingNumber::new(self.to_route),
            amount: self.amount,
            posted_at: self.timestamp.with_timezone(&Utc),
        }
    }

    /// Converts the row into a ledger entry tagged with its sequence id.
    #[must_use]
    pub fn into_sequenced(self) -> SequencedEntry {
        SequencedEntry {
            sequence_id: SequenceId(self.transaction_id),
            entry: self.into_entry(),
        }
    }
}
