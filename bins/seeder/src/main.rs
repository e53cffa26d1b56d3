//! Demo ledger seeder for Ledgerview development and testing.
//!
//! Appends a small, deterministic set of transfers: payroll deposits from an
//! external bank, then peer payments between the demo accounts.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use ledgerview_core::ledger::LedgerEntry;
use ledgerview_db::LedgerRepository;
use ledgerview_shared::AppConfig;

/// Demo accounts in the local routing domain.
const DEMO_ACCOUNTS: [&str; 3] = ["1011226111", "1033623433", "1055757655"];

/// Account at some other bank that pays everyone's salary.
const PAYROLL_ACCOUNT: &str = "9099791699";
const PAYROLL_ROUTE: &str = "808889588";

/// Salary in cents.
const SALARY: i64 = 250_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let local = config.ledger.local_routing_num.as_str();

    println!("Connecting to database...");
    let db = ledgerview_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let repo = LedgerRepository::new(db);

    let start = Utc::now() - Duration::days(30);
    let mut appended = 0usize;

    println!("Seeding payroll deposits...");
    for (i, account) in DEMO_ACCOUNTS.iter().enumerate() {
        let entry = LedgerEntry {
            from_account: PAYROLL_ACCOUNT.into(),
            from_route: PAYROLL_ROUTE.into(),
            to_account: (*account).into(),
            to_route: local.into(),
            amount: SALARY,
            posted_at: start + Duration::hours(i64::try_from(i)?),
        };
        repo.append(&entry).await?;
        appended += 1;
    }

    println!("Seeding peer payments...");
    for day in 1..=20i64 {
        let from = DEMO_ACCOUNTS[usize::try_from(day)? % DEMO_ACCOUNTS.len()];
        let to = DEMO_ACCOUNTS[usize::try_from(day + 1)? % DEMO_ACCOUNTS.len()];
        let entry = LedgerEntry {
            from_account: from.into(),
            from_route: local.into(),
            to_account: to.into(),
            to_route: local.into(),
            amount: 1_000 + day * 125,
            posted_at: start + Duration::days(day),
        };
        repo.append(&entry).await?;
        appended += 1;
    }

    println!("Seeding complete! Appended {appended} transactions.");
    Ok(())
}
