//! Creates the append-only transactions ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(INDEXES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    transaction_id BIGSERIAL PRIMARY KEY,
    from_acct VARCHAR(10) NOT NULL,
    from_route VARCHAR(9) NOT NULL,
    to_acct VARCHAR(10) NOT NULL,
    to_route VARCHAR(9) NOT NULL,
    amount BIGINT NOT NULL CHECK (amount > 0),
    timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Entries are immutable once written
CREATE RULE transactions_no_update AS ON UPDATE TO transactions DO INSTEAD NOTHING;
CREATE RULE transactions_no_delete AS ON DELETE TO transactions DO INSTEAD NOTHING;
";

const INDEXES_SQL: &str = r"
CREATE INDEX idx_transactions_from ON transactions (from_acct, from_route, transaction_id DESC);
CREATE INDEX idx_transactions_to ON transactions (to_acct, to_route, transaction_id DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
";
