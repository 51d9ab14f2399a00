//! Defines the endpoint for opening a new account.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    account::{Account, NewAccount, create_account},
    json::{ApiJson, require_text},
    transaction::TransactionResponse,
};

/// The JSON body for opening an account.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub customer_id: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub branch: Option<String>,
    pub number: Option<String>,
}

impl CreateAccountRequest {
    fn validate(self) -> Result<NewAccount, Error> {
        Ok(NewAccount {
            customer_id: require_text(self.customer_id, "customerId")?,
            account_type: require_text(self.account_type, "type")?,
            branch: require_text(self.branch, "branch")?,
            number: require_text(self.number, "number")?,
        })
    }
}

/// An account as returned to API clients.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub branch: String,
    pub number: String,
    pub balance: String,
    pub transactions: Vec<TransactionResponse>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            customer_id: account.customer_id,
            account_type: account.account_type,
            branch: account.branch,
            number: account.number,
            balance: account.balance.to_string(),
            transactions: Vec::new(),
        }
    }
}

/// A route handler for opening an account, responds with 201 and the new account.
pub async fn create_account_endpoint(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), Error> {
    let new_account = request.validate()?;

    let connection = state.connection()?;
    let account = create_account(new_account, &connection)?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, build_router,
        customer::{NewCustomer, create_customer},
        endpoints,
    };

    use super::AccountResponse;

    fn get_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();
        create_customer(
            NewCustomer {
                name: "Maria Silva".to_owned(),
                cpf: "12345678900".to_owned(),
                email: "maria@x.com".to_owned(),
                consent_given: true,
            },
            &state.connection().unwrap(),
        )
        .unwrap();

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn can_open_account() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({
                "customerId": "cus_001",
                "type": "checking",
                "branch": "0001",
                "number": "12345-6"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(
            response.json::<AccountResponse>(),
            AccountResponse {
                id: "acc_001".to_owned(),
                customer_id: "cus_001".to_owned(),
                account_type: "checking".to_owned(),
                branch: "0001".to_owned(),
                number: "12345-6".to_owned(),
                balance: "0.00".to_owned(),
                transactions: vec![],
            }
        );
    }

    #[tokio::test]
    async fn second_customer_can_reuse_branch_and_number() {
        let server = get_test_server();
        server
            .post(endpoints::CUSTOMERS)
            .json(&json!({
                "name": "João Souza",
                "cpf": "98765432100",
                "email": "joao@x.com",
                "consentGiven": false
            }))
            .await
            .assert_status(StatusCode::CREATED);

        for customer_id in ["cus_001", "cus_002"] {
            let response = server
                .post(endpoints::ACCOUNTS)
                .json(&json!({
                    "customerId": customer_id,
                    "type": "checking",
                    "branch": "0001",
                    "number": "12345-6"
                }))
                .await;

            response.assert_status(StatusCode::CREATED);
            assert_eq!(response.json::<AccountResponse>().customer_id, customer_id);
        }
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({ "customerId": "cus_001", "type": "checking", "branch": "0001" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("number"));
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({
                "customerId": "cus_404",
                "type": "checking",
                "branch": "0001",
                "number": "12345-6"
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["code"], "CUSTOMER_NOT_FOUND");
    }
}
