//! Postgres-backed ledger store.
//!
//! Reads the append-only `transactions` table for the ledger reader and the
//! derived views. Writes are limited to [`LedgerRepository::append`], used by
//! the seeder and integration tests.

use async_trait::async_trait;
use ledgerview_core::ledger::{LedgerEntry, LedgerStore, SequencedEntry, StoreError};
use ledgerview_shared::types::{AccountNumber, RoutingNumber, SequenceId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use tracing::debug;

use crate::entities::transactions;

const MAX_SEQUENCE_SQL: &str =
    "SELECT COALESCE(MAX(transaction_id), 0)::BIGINT AS value FROM transactions";

// Credits minus debits, summed in NUMERIC so only the final value can overflow.
const BALANCE_SQL: &str = r"
SELECT CAST(
    COALESCE((SELECT SUM(amount) FROM transactions WHERE to_acct = $1 AND to_route = $2), 0)
  - COALESCE((SELECT SUM(amount) FROM transactions WHERE from_acct = $1 AND from_route = $2), 0)
AS BIGINT) AS value
";

#[derive(Debug, FromQueryResult)]
struct ScalarRow {
    value: i64,
}

/// Repository over the `transactions` table.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry and returns the sequence id the database assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including when the amount is
    /// not positive.
    pub async fn append(&self, entry: &LedgerEntry) -> Result<SequenceId, DbErr> {
        let model = transactions::ActiveModel {
            from_acct: Set(entry.from_account.as_str().to_owned()),
            from_route: Set(entry.from_route.as_str().to_owned()),
            to_acct: Set(entry.to_account.as_str().to_owned()),
            to_route: Set(entry.to_route.as_str().to_owned()),
            amount: Set(entry.amount),
            timestamp: Set(entry.posted_at.fixed_offset()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        debug!(sequence_id = model.transaction_id, "appended ledger entry");
        Ok(SequenceId(model.transaction_id))
    }

    async fn scalar(&self, sql: &str, values: Vec<sea_orm::Value>) -> Result<i64, DbErr> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);
        ScalarRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(|row| row.value)
            .ok_or_else(|| DbErr::RecordNotFound("scalar query returned no row".to_string()))
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn max_sequence_id(&self) -> Result<SequenceId, StoreError> {
        let value = self
            .scalar(MAX_SEQUENCE_SQL, Vec::new())
            .await
            .map_err(store_error)?;
        Ok(SequenceId(value))
    }

    async fn entries_after(&self, after: SequenceId) -> Result<Vec<SequencedEntry>, StoreError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::TransactionId.gt(after.value()))
            .order_by_asc(transactions::Column::TransactionId)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(transactions::Model::into_sequenced)
            .collect())
    }

    async fn aggregate_balance(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
    ) -> Result<i64, StoreError> {
        self.scalar(
            BALANCE_SQL,
            vec![account.as_str().into(), route.as_str().into()],
        )
        .await
        .map_err(store_error)
    }

    async fn history_for(
        &self,
        account: &AccountNumber,
        route: &RoutingNumber,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let side = Condition::any()
            .add(
                Condition::all()
                    .add(transactions::Column::FromAcct.eq(account.as_str()))
                    .add(transactions::Column::FromRoute.eq(route.as_str())),
            )
            .add(
                Condition::all()
                    .add(transactions::Column::ToAcct.eq(account.as_str()))
                    .add(transactions::Column::ToRoute.eq(route.as_str())),
            );

        let mut query = transactions::Entity::find()
            .filter(side)
            .order_by_desc(transactions::Column::TransactionId);
        if let Some(limit) = limit {
            query = query.limit(u64::try_from(limit).unwrap_or(u64::MAX));
        }

        let rows = query.all(&self.db).await.map_err(store_error)?;
        Ok(rows.into_iter().map(transactions::Model::into_entry).collect())
    }
}

/// Classifies a database error for the reader and the caches.
fn store_error(err: DbErr) -> StoreError {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Unavailable(err.to_string()),
        DbErr::Type(_) | DbErr::TryIntoErr { .. } | DbErr::RecordNotFound(_) => {
            StoreError::InvalidData(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}
