//! Defines the public endpoint for finding a customer by CPF.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    customer::{get_customer_by_cpf, validate_cpf},
};

/// The minimal customer details partners need to link their records to ours.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CustomerLookupResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub cpf: String,
}

/// A route handler for looking up a customer ID from a CPF.
pub async fn lookup_customer_by_cpf_endpoint(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<Json<CustomerLookupResponse>, Error> {
    validate_cpf(&cpf)?;

    let connection = state.connection()?;
    let customer = get_customer_by_cpf(&cpf, &connection)?;

    Ok(Json(CustomerLookupResponse {
        id: customer.id,
        cpf: customer.cpf,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, build_router,
        customer::{NewCustomer, create_customer},
        endpoints::{self, format_endpoint},
    };

    use super::CustomerLookupResponse;

    fn get_test_server_with_customer() -> TestServer {
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
    async fn finds_customer_by_cpf() {
        let server = get_test_server_with_customer();

        let response = server
            .get(&format_endpoint(endpoints::CUSTOMER_BY_CPF, "12345678900"))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<CustomerLookupResponse>(),
            CustomerLookupResponse {
                id: "cus_001".to_owned(),
                cpf: "12345678900".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_cpf_is_not_found() {
        let server = get_test_server_with_customer();

        server
            .get(&format_endpoint(endpoints::CUSTOMER_BY_CPF, "00000000000"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_cpf_is_bad_request() {
        let server = get_test_server_with_customer();

        server
            .get(&format_endpoint(endpoints::CUSTOMER_BY_CPF, "123"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
