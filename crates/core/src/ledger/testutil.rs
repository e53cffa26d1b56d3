//! Builders shared by the unit tests in this crate.

use chrono::{TimeZone, Utc};

use super::entry::LedgerEntry;

/// Routing number used as the local domain in tests.
pub const LOCAL: &str = "883745000";

/// Routing number of some other bank.
pub const FOREIGN: &str = "111111111";

/// A transfer between two local accounts.
pub fn transfer(from: &str, to: &str, amount: i64) -> LedgerEntry {
    routed(from, LOCAL, to, LOCAL, amount)
}

/// A transfer with explicit routing on both sides.
pub fn routed(from: &str, from_route: &str, to: &str, to_route: &str, amount: i64) -> LedgerEntry {
    LedgerEntry {
        from_account: from.into(),
        from_route: from_route.into(),
        to_account: to.into(),
        to_route: to_route.into(),
        amount,
        posted_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
    }
}
