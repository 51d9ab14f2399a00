//! Defines the endpoints for reading and revoking a single consent.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    consent::{ConsentResponse, get_consent, revoke_consent},
};

/// A route handler for reading a consent by its ID.
pub async fn get_consent_endpoint(
    State(state): State<AppState>,
    Path(consent_id): Path<String>,
) -> Result<Json<ConsentResponse>, Error> {
    let connection = state.connection()?;
    let consent = get_consent(&consent_id, &connection)?;

    Ok(Json(consent.try_into()?))
}

/// A route handler for revoking a consent, responds with 204 on success.
///
/// Revoking a consent that was already revoked is a conflict.
pub async fn revoke_consent_endpoint(
    State(state): State<AppState>,
    Path(consent_id): Path<String>,
) -> Result<StatusCode, Error> {
    let connection = state.connection()?;
    revoke_consent(&consent_id, OffsetDateTime::now_utc(), &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;
    use time::OffsetDateTime;

    use crate::{
        AppState, build_router,
        consent::{ConsentResponse, create_consent},
        customer::{NewCustomer, create_customer},
        endpoints, format_endpoint,
    };

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
            create_consent(
                "cus_001",
                vec!["READ_BALANCES".to_owned()],
                OffsetDateTime::now_utc(),
                &connection,
            )
            .unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn can_get_consent() {
        let server = get_test_server();

        let response = server
            .get(&format_endpoint(endpoints::CONSENT, "con_001"))
            .await;

        response.assert_status_ok();
        let consent = response.json::<ConsentResponse>();
        assert_eq!(consent.id, "con_001");
        assert_eq!(consent.status, "AUTHORIZED");
    }

    #[tokio::test]
    async fn get_missing_consent_is_not_found() {
        let server = get_test_server();

        let response = server
            .get(&format_endpoint(endpoints::CONSENT, "con_404"))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["code"], "CONSENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn revoke_then_get_shows_revoked() {
        let server = get_test_server();
        let consent_path = format_endpoint(endpoints::CONSENT, "con_001");

        server
            .delete(&consent_path)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let consent = server.get(&consent_path).await.json::<ConsentResponse>();
        assert_eq!(consent.status, "REVOKED");
    }

    #[tokio::test]
    async fn revoke_twice_is_conflict() {
        let server = get_test_server();
        let consent_path = format_endpoint(endpoints::CONSENT, "con_001");
        server.delete(&consent_path).await;

        let response = server.delete(&consent_path).await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["category"], "Conflict");
    }

    #[tokio::test]
    async fn revoke_missing_consent_is_not_found() {
        let server = get_test_server();

        server
            .delete(&format_endpoint(endpoints::CONSENT, "con_404"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
