//! An Open Finance style banking-record API.
//!
//! The library creates customers, opens accounts, records credit and debit
//! transactions against running balances, and gates balance and statement reads
//! behind time-bounded customer consent records.
//!
//! All data lives in a SQLite database reached through a shared [rusqlite]
//! connection owned by [AppState]. Balances only ever change inside
//! [apply_transaction], which runs as a single write-locked database transaction.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::signal;

mod account;
mod app_state;
mod consent;
mod customer;
mod db;
mod endpoints;
mod id_sequence;
mod json;
mod logging;
mod money;
mod not_found;
mod routing;
mod status;
mod transaction;

pub use account::{Account, AccountId, NewAccount, create_account, get_account};
pub use app_state::AppState;
pub use consent::{
    Consent, ConsentDecision, ConsentId, ConsentStatus, DenyReason, authorize, create_consent,
    find_active_consent, get_consent, revoke_consent,
};
pub use customer::{Customer, CustomerId, NewCustomer, create_customer, get_customer_by_cpf};
pub use db::{initialize as initialize_db, open_connection};
pub use endpoints::format_endpoint;
pub use id_sequence::{Entity, next_id};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    Transaction, TransactionId, TransactionRequest, TransactionType, apply_transaction,
    list_transactions,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or empty in the request.
    #[error("the field {0} is required")]
    MissingField(&'static str),

    /// A field was present but its value is not acceptable.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// The name of the offending field as seen by the client.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The request body could not be parsed as the expected JSON document.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// The request body could not be read within the size limit.
    #[error("the request body could not be read within {0} bytes")]
    PayloadTooLarge(usize),

    /// The transaction type was neither `credit` nor `debit`.
    #[error("transaction type must be credit or debit, got \"{0}\"")]
    InvalidTransactionType(String),

    /// A debit asked for more money than the account holds.
    ///
    /// Overdrafts are not allowed, a debit may only bring the balance down to zero.
    #[error("insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The account that was debited.
        account_id: String,
        /// The balance at the time the debit was attempted.
        balance: Decimal,
        /// The amount of the rejected debit.
        requested: Decimal,
    },

    /// The customer ID does not refer to a customer.
    #[error("customer not found")]
    CustomerNotFound,

    /// The account ID does not refer to an account.
    #[error("account not found")]
    AccountNotFound,

    /// The consent ID does not refer to a consent.
    #[error("consent not found")]
    ConsentNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A customer with the same CPF is already registered.
    #[error("a customer with this CPF already exists")]
    DuplicateCpf,

    /// Tried to revoke a consent that was already revoked.
    #[error("the consent has already been revoked")]
    ConsentAlreadyRevoked,

    /// The customer owning the account has no active consent.
    #[error("customer {customer_id} has not consented to sharing data for account {account_id}")]
    ConsentRequired {
        /// The customer that owns the account.
        customer_id: String,
        /// The account whose data was requested.
        account_id: String,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while serializing or deserializing JSON stored in the database.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// A timestamp fell outside of the range supported by the `time` crate.
    #[error("date out of range: {0}")]
    DateOutOfRange(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to clients for every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    category: &'static str,
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField(_)
            | Error::InvalidField { .. }
            | Error::InvalidJson(_)
            | Error::InvalidTransactionType(_)
            | Error::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::CustomerNotFound
            | Error::AccountNotFound
            | Error::ConsentNotFound
            | Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateCpf | Error::ConsentAlreadyRevoked => StatusCode::CONFLICT,
            Error::ConsentRequired { .. } => StatusCode::FORBIDDEN,
            Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::JSONSerializationError(_)
            | Error::DateOutOfRange(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The coarse, machine-readable class of the error.
    fn category(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE => "BadRequest",
            StatusCode::NOT_FOUND => "NotFound",
            StatusCode::CONFLICT => "Conflict",
            StatusCode::FORBIDDEN => "Forbidden",
            _ => "InternalError",
        }
    }

    /// The fine-grained, machine-readable error code.
    fn code(&self) -> &'static str {
        match self {
            Error::MissingField(_) | Error::InvalidField { .. } | Error::InvalidJson(_) => {
                "VALIDATION_ERROR"
            }
            Error::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Error::InvalidTransactionType(_) => "INVALID_TRANSACTION_TYPE",
            Error::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Error::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Error::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Error::ConsentNotFound => "CONSENT_NOT_FOUND",
            Error::NotFound => "NOT_FOUND",
            Error::DuplicateCpf => "DUPLICATE_CPF",
            Error::ConsentAlreadyRevoked => "CONSENT_ALREADY_REVOKED",
            Error::ConsentRequired { .. } => "CONSENT_REQUIRED",
            Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::JSONSerializationError(_)
            | Error::DateOutOfRange(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, customer_id, account_id) = match self {
            Error::ConsentRequired {
                ref customer_id,
                ref account_id,
            } => (
                "Access denied: the customer has not authorized sharing their financial data."
                    .to_owned(),
                Some(customer_id.clone()),
                Some(account_id.clone()),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            ref error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    "An unexpected error occurred, try again later.".to_owned(),
                    None,
                    None,
                )
            }
            ref error => (error.to_string(), None, None),
        };

        let body = ErrorBody {
            category: self.category(),
            code: self.code(),
            message,
            customer_id,
            account_id,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use serde_json::Value;

    use crate::Error;

    async fn parse_body(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case::missing_field(Error::MissingField("name"), StatusCode::BAD_REQUEST, "BadRequest", "VALIDATION_ERROR")]
    #[case::invalid_type(
        Error::InvalidTransactionType("refund".to_owned()),
        StatusCode::BAD_REQUEST,
        "BadRequest",
        "INVALID_TRANSACTION_TYPE"
    )]
    #[case::insufficient_funds(
        Error::InsufficientFunds {
            account_id: "acc_001".to_owned(),
            balance: Decimal::new(10000, 2),
            requested: Decimal::new(12000, 2),
        },
        StatusCode::BAD_REQUEST,
        "BadRequest",
        "INSUFFICIENT_FUNDS"
    )]
    #[case::payload_too_large(
        Error::PayloadTooLarge(1024),
        StatusCode::PAYLOAD_TOO_LARGE,
        "BadRequest",
        "PAYLOAD_TOO_LARGE"
    )]
    #[case::account_not_found(Error::AccountNotFound, StatusCode::NOT_FOUND, "NotFound", "ACCOUNT_NOT_FOUND")]
    #[case::duplicate_cpf(Error::DuplicateCpf, StatusCode::CONFLICT, "Conflict", "DUPLICATE_CPF")]
    #[case::already_revoked(
        Error::ConsentAlreadyRevoked,
        StatusCode::CONFLICT,
        "Conflict",
        "CONSENT_ALREADY_REVOKED"
    )]
    #[case::lock_error(
        Error::DatabaseLockError,
        StatusCode::INTERNAL_SERVER_ERROR,
        "InternalError",
        "INTERNAL_ERROR"
    )]
    #[tokio::test]
    async fn maps_error_to_status_and_codes(
        #[case] error: Error,
        #[case] want_status: StatusCode,
        #[case] want_category: &str,
        #[case] want_code: &str,
    ) {
        let (status, body) = parse_body(error).await;

        assert_eq!(status, want_status);
        assert_eq!(body["category"], want_category);
        assert_eq!(body["code"], want_code);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn consent_required_names_customer_and_account() {
        let (status, body) = parse_body(Error::ConsentRequired {
            customer_id: "cus_001".to_owned(),
            account_id: "acc_001".to_owned(),
        })
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["category"], "Forbidden");
        assert_eq!(body["code"], "CONSENT_REQUIRED");
        assert_eq!(body["customerId"], "cus_001");
        assert_eq!(body["accountId"], "acc_001");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (_, body) = parse_body(Error::SqlError(rusqlite::Error::InvalidQuery)).await;

        let message = body["message"].as_str().unwrap();
        assert!(!message.contains("SQL"), "message leaked details: {message}");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(Error::from(rusqlite::Error::QueryReturnedNoRows), Error::NotFound);
    }
}
