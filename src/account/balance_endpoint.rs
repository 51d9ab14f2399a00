//! Defines the consent-gated endpoint for reading an account balance.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, account::get_account};

/// The balance of an account.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: String,
}

/// A route handler for reading the current balance of an account.
///
/// This route must sit behind [consent_guard](crate::consent::consent_guard).
/// The balance is read from the database on every request.
pub async fn get_balance_endpoint(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, Error> {
    let connection = state.connection()?;
    let account = get_account(&account_id, &connection)?;

    Ok(Json(BalanceResponse {
        account_id: account.id,
        balance: account.balance.to_string(),
    }))
}
