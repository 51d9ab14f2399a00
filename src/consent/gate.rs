//! The consent gate that guards balance and statement reads.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    consent::{Consent, find_active_consent},
};

/// Why the gate refused access to an account's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// There is no account with the requested ID.
    AccountNotFound,
    /// The account exists but its owner does not.
    CustomerNotFound,
    /// The owner has no authorized, unexpired consent.
    NoActiveConsent {
        /// The owner of the account.
        customer_id: String,
    },
}

/// The outcome of checking consent for an account.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsentDecision {
    /// Access is allowed under the given consent.
    Allow(Consent),
    /// Access is refused.
    Deny(DenyReason),
}

/// Check whether the owner of `account_id` has an active consent at `now`.
///
/// The check always goes to the database, a consent revoked a moment ago
/// takes effect on the next call.
///
/// # Errors
/// Returns [Error::SqlError] if the database could not be queried.
pub fn authorize(
    account_id: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<ConsentDecision, Error> {
    let owner: Option<(String, Option<String>)> = connection
        .query_row(
            "SELECT account.customer_id, customer.id
             FROM account LEFT JOIN customer ON customer.id = account.customer_id
             WHERE account.id = ?1",
            [account_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let customer_id = match owner {
        None => return Ok(ConsentDecision::Deny(DenyReason::AccountNotFound)),
        Some((_, None)) => return Ok(ConsentDecision::Deny(DenyReason::CustomerNotFound)),
        Some((customer_id, Some(_))) => customer_id,
    };

    let decision = match find_active_consent(&customer_id, now, connection)? {
        Some(consent) => ConsentDecision::Allow(consent),
        None => ConsentDecision::Deny(DenyReason::NoActiveConsent { customer_id }),
    };

    Ok(decision)
}

impl DenyReason {
    fn into_error(self, account_id: String) -> Error {
        match self {
            DenyReason::AccountNotFound => Error::AccountNotFound,
            DenyReason::CustomerNotFound => Error::CustomerNotFound,
            DenyReason::NoActiveConsent { customer_id } => Error::ConsentRequired {
                customer_id,
                account_id,
            },
        }
    }
}

/// Middleware function that only lets requests for an account through when its
/// owner has an active consent.
///
/// The governing [Consent] is added to the request extensions.
/// Denied requests get a 404 for a missing account or customer, and a 403 when
/// consent is missing, revoked or expired.
///
/// Must be added to routes with an `{account_id}` path parameter using
/// [axum::middleware::from_fn_with_state].
pub async fn consent_guard(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = match state.connection() {
        Ok(connection) => authorize(&account_id, OffsetDateTime::now_utc(), &connection),
        Err(error) => Err(error),
    };

    match decision {
        Ok(ConsentDecision::Allow(consent)) => {
            tracing::debug!("Consent {} allows access to {account_id}", consent.id);
            request.extensions_mut().insert(consent);
            next.run(request).await
        }
        Ok(ConsentDecision::Deny(reason)) => {
            tracing::warn!("Access to {account_id} denied: {reason:?}");
            reason.into_error(account_id).into_response()
        }
        Err(error) => error.into_response(),
    }
}
