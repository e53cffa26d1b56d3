//! Account balance routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use ledgerview_shared::types::AccountNumber;
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// Creates the balance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/balances/{account_id}", get(get_balance))
}

/// Response for a balance lookup.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account looked up.
    pub account_id: AccountNumber,
    /// Balance in minor units.
    pub balance: i64,
}

/// GET `/balances/{account_id}` - Current balance of a local account.
async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = AccountNumber::parse(&account_id)?;
    let balance = state.balances.get_balance(&account).await?;

    Ok(Json(BalanceResponse {
        account_id: account,
        balance,
    }))
}
