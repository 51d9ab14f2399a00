//! Defines the consent-gated endpoint for listing an account's transactions.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, Error,
    account::get_account,
    transaction::{TransactionResponse, list_transactions},
};

/// A route handler for listing the transactions of an account in creation order.
///
/// Responds with an empty list when the account has no transactions. This route
/// must sit behind [consent_guard](crate::consent::consent_guard).
pub async fn get_statement_endpoint(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, Error> {
    let connection = state.connection()?;
    get_account(&account_id, &connection)?;

    let transactions = list_transactions(&account_id, &connection)?
        .into_iter()
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(transactions))
}
