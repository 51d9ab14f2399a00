//! Defines the endpoint for applying a credit or debit to an account.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    json::{ApiJson, require_text},
    transaction::{Transaction, TransactionRequest, apply_transaction},
};

/// The JSON body for applying a transaction.
///
/// `amount` accepts either a JSON number or a decimal string.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub account_id: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category: Option<String>,
}

impl CreateTransactionRequest {
    fn validate(self) -> Result<TransactionRequest, Error> {
        Ok(TransactionRequest {
            account_id: require_text(self.account_id, "accountId")?,
            description: require_text(self.description, "description")?,
            amount: self.amount.ok_or(Error::MissingField("amount"))?,
            transaction_type: require_text(self.transaction_type, "type")?,
            category: require_text(self.category, "category")?,
        })
    }
}

/// A transaction as returned to API clients.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub account_id: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub category: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            account_id: transaction.account_id,
            date: transaction.date.to_string(),
            description: transaction.description,
            amount: transaction.amount.to_string(),
            transaction_type: transaction.transaction_type.to_string(),
            category: transaction.category,
        }
    }
}

/// A route handler for applying a transaction, responds with 201 and the recorded transaction.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), Error> {
    let request = request.validate()?;
    let today = OffsetDateTime::now_utc().date();

    let connection = state.connection()?;
    let transaction = apply_transaction(request, today, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rstest::rstest;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::OffsetDateTime;

    use crate::{
        AppState,
        account::{NewAccount, create_account},
        build_router,
        customer::{NewCustomer, create_customer},
        endpoints,
    };

    use super::TransactionResponse;

    fn get_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();
        {
            let connection = state.connection().unwrap();
            create_customer(
                NewCustomer {
                    name: "Maria Silva".to_owned(),
                    cpf: "12345678900".to_owned(),
                    email: "maria@x.com".to_owned(),
                    consent_given: true,
                },
                &connection,
            )
            .unwrap();
            create_account(
                NewAccount {
                    customer_id: "cus_001".to_owned(),
                    account_type: "checking".to_owned(),
                    branch: "0001".to_owned(),
                    number: "12345-6".to_owned(),
                },
                &connection,
            )
            .unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn can_apply_credit() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "accountId": "acc_001",
                "description": "Salary",
                "amount": 1500.00,
                "type": "credit",
                "category": "income"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(
            response.json::<TransactionResponse>(),
            TransactionResponse {
                id: "txn_001".to_owned(),
                account_id: "acc_001".to_owned(),
                date: OffsetDateTime::now_utc().date().to_string(),
                description: "Salary".to_owned(),
                amount: "1500.00".to_owned(),
                transaction_type: "credit".to_owned(),
                category: "income".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn amount_can_be_a_string() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "accountId": "acc_001",
                "description": "Salary",
                "amount": "99.90",
                "type": "credit",
                "category": "income"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<TransactionResponse>().amount, "99.90");
    }

    #[rstest]
    #[case::missing_amount(
        json!({"accountId": "acc_001", "description": "x", "type": "credit", "category": "c"}),
        "VALIDATION_ERROR"
    )]
    #[case::negative_amount(
        json!({"accountId": "acc_001", "description": "x", "amount": -5, "type": "credit", "category": "c"}),
        "VALIDATION_ERROR"
    )]
    #[case::invalid_type(
        json!({"accountId": "acc_001", "description": "x", "amount": 5, "type": "transfer", "category": "c"}),
        "INVALID_TRANSACTION_TYPE"
    )]
    #[case::insufficient_funds(
        json!({"accountId": "acc_001", "description": "x", "amount": 5, "type": "debit", "category": "c"}),
        "INSUFFICIENT_FUNDS"
    )]
    #[tokio::test]
    async fn rejected_transactions_are_bad_requests(#[case] body: Value, #[case] want_code: &str) {
        let server = get_test_server();

        let response = server.post(endpoints::TRANSACTIONS).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], want_code);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let server = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "accountId": "acc_404",
                "description": "Salary",
                "amount": 10,
                "type": "credit",
                "category": "income"
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["code"], "ACCOUNT_NOT_FOUND");
    }
}
