//! Defines the endpoint for registering a new customer.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    account::AccountResponse,
    customer::{Customer, NewCustomer, create_customer},
    json::{ApiJson, require_text},
};

/// The JSON body for registering a customer.
///
/// Every field is optional here so that a missing field is reported by name
/// instead of as a generic parse failure.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub consent_given: Option<bool>,
}

impl CreateCustomerRequest {
    fn validate(self) -> Result<NewCustomer, Error> {
        let name = require_text(self.name, "name")?;
        let cpf = require_text(self.cpf, "cpf")?;
        let email = require_text(self.email, "email")?;
        let consent_given = self
            .consent_given
            .ok_or(Error::MissingField("consentGiven"))?;

        Ok(NewCustomer {
            name,
            cpf,
            email,
            consent_given,
        })
    }
}

/// A customer as returned to API clients.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub consent_given: bool,
    pub accounts: Vec<AccountResponse>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            cpf: customer.cpf,
            email: customer.email,
            consent_given: customer.consent_given,
            accounts: Vec::new(),
        }
    }
}

/// A route handler for registering a customer, responds with 201 and the new customer.
pub async fn create_customer_endpoint(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), Error> {
    let new_customer = request.validate()?;

    let connection = state.connection()?;
    let customer = create_customer(new_customer, &connection)?;

    Ok((StatusCode::CREATED, Json(customer.into())))
}
