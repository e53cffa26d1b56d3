//! Transaction history routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use ledgerview_core::ledger::LedgerEntry;
use ledgerview_shared::types::AccountNumber;
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// Creates the transaction history routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions/{account_id}", get(get_transactions))
}

/// Response for a history lookup.
#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    /// Account looked up.
    pub account_id: AccountNumber,
    /// Most recent transactions, newest first.
    pub transactions: Vec<LedgerEntry>,
}

/// GET `/transactions/{account_id}` - Recent transactions of a local account.
async fn get_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let account = AccountNumber::parse(&account_id)?;
    let history = state.history.get_history(&account).await?;

    Ok(Json(TransactionsResponse {
        account_id: account,
        transactions: history.as_ref().clone(),
    }))
}
