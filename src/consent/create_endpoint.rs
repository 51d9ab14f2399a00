//! Defines the endpoint for creating a consent.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    AppState, Error,
    consent::{Consent, create_consent},
    json::{ApiJson, require_text},
};

/// The JSON body for creating a consent.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsentRequest {
    pub customer_id: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// A consent as returned to API clients. Timestamps are RFC 3339 strings in UTC.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_id: String,
    pub permissions: Vec<String>,
    pub status: String,
    pub expiration_date_time: String,
    pub expiration_date: String,
    pub created_at: String,
    pub updated_at: String,
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, Error> {
    timestamp
        .format(&Rfc3339)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))
}

impl TryFrom<Consent> for ConsentResponse {
    type Error = Error;

    fn try_from(consent: Consent) -> Result<Self, Self::Error> {
        Ok(Self {
            expiration_date_time: format_timestamp(consent.expires_at)?,
            expiration_date: format_timestamp(consent.expires_at)?,
            created_at: format_timestamp(consent.created_at)?,
            updated_at: format_timestamp(consent.updated_at)?,
            id: consent.id,
            customer_id: consent.customer_id,
            permissions: consent.permissions,
            status: consent.status.to_string(),
        })
    }
}

/// A route handler for creating a consent, responds with 201 and the new consent.
pub async fn create_consent_endpoint(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateConsentRequest>,
) -> Result<(StatusCode, Json<ConsentResponse>), Error> {
    let customer_id = require_text(request.customer_id, "customerId")?;
    let permissions = request.permissions.ok_or(Error::MissingField("permissions"))?;

    let connection = state.connection()?;
    let consent = create_consent(
        &customer_id,
        permissions,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(consent.try_into()?)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rstest::rstest;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    use crate::{
        AppState, build_router,
        customer::{NewCustomer, create_customer},
        endpoints,
    };

    use super::ConsentResponse;

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
    async fn can_create_consent() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CONSENTS)
            .json(&json!({
                "customerId": "cus_001",
                "permissions": ["READ_ACCOUNTS", "READ_BALANCES"]
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let consent = response.json::<ConsentResponse>();
        assert_eq!(consent.id, "con_001");
        assert_eq!(consent.customer_id, "cus_001");
        assert_eq!(consent.permissions, vec!["READ_ACCOUNTS", "READ_BALANCES"]);
        assert_eq!(consent.status, "AUTHORIZED");
        assert_eq!(consent.created_at, consent.updated_at);
        assert_eq!(consent.expiration_date, consent.expiration_date_time);

        let created_at = OffsetDateTime::parse(&consent.created_at, &Rfc3339).unwrap();
        let expires_at = OffsetDateTime::parse(&consent.expiration_date_time, &Rfc3339).unwrap();
        assert_eq!(expires_at.year(), created_at.year() + 1);
        assert_eq!(expires_at.time(), created_at.time());
    }

    #[rstest]
    #[case::missing_customer(json!({"permissions": ["READ_BALANCES"]}))]
    #[case::missing_permissions(json!({"customerId": "cus_001"}))]
    #[case::empty_permissions(json!({"customerId": "cus_001", "permissions": []}))]
    #[case::blank_permission(json!({"customerId": "cus_001", "permissions": [""]}))]
    #[case::permissions_not_a_list(json!({"customerId": "cus_001", "permissions": "READ_BALANCES"}))]
    #[tokio::test]
    async fn invalid_consent_is_bad_request(#[case] body: Value) {
        let server = get_test_server();

        let response = server.post(endpoints::CONSENTS).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["category"], "BadRequest");
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CONSENTS)
            .json(&json!({"customerId": "cus_404", "permissions": ["READ_BALANCES"]}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["code"], "CUSTOMER_NOT_FOUND");
    }
}
