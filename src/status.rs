//! The API status document served at the root route.

use axum::Json;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{Error, endpoints};

/// A route exposed by the API.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RouteDescription {
    pub method: String,
    pub path: String,
    pub description: String,
    pub requires_consent: bool,
}

/// Describes the running API and lists its routes.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    pub name: String,
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub endpoints: Vec<RouteDescription>,
}

fn route(method: &str, path: &str, description: &str, requires_consent: bool) -> RouteDescription {
    RouteDescription {
        method: method.to_owned(),
        path: path.to_owned(),
        description: description.to_owned(),
        requires_consent,
    }
}

/// A route handler for the API status document.
pub async fn get_api_status() -> Result<Json<ApiStatus>, Error> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(Json(ApiStatus {
        name: env!("CARGO_PKG_NAME").to_owned(),
        status: "online".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        timestamp,
        endpoints: vec![
            route("POST", endpoints::CUSTOMERS, "Register a customer", false),
            route(
                "GET",
                endpoints::CUSTOMER_BY_CPF,
                "Look up a customer by CPF",
                false,
            ),
            route("POST", endpoints::ACCOUNTS, "Open an account", false),
            route(
                "GET",
                endpoints::ACCOUNT_BALANCE,
                "Read an account balance",
                true,
            ),
            route(
                "POST",
                endpoints::TRANSACTIONS,
                "Apply a credit or debit",
                false,
            ),
            route(
                "GET",
                endpoints::ACCOUNT_TRANSACTIONS,
                "List an account's transactions",
                true,
            ),
            route("POST", endpoints::CONSENTS, "Authorize a consent", false),
            route("GET", endpoints::CONSENT, "Read a consent", false),
            route("DELETE", endpoints::CONSENT, "Revoke a consent", false),
        ],
    }))
}
