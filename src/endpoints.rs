//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/openfinance/consents/{consent_id}', use [format_endpoint].

/// The API status document.
pub const ROOT: &str = "/";
/// Alias of [ROOT] for clients that expect the status under `/api`.
pub const API_STATUS: &str = "/api";
/// The route for registering customers.
pub const CUSTOMERS: &str = "/openfinance/customers";
/// The route for looking up a customer by CPF.
pub const CUSTOMER_BY_CPF: &str = "/openfinance/customers/lookup/by-cpf/{cpf}";
/// The route for opening accounts.
pub const ACCOUNTS: &str = "/openfinance/accounts";
/// The route for reading an account's balance, requires consent.
pub const ACCOUNT_BALANCE: &str = "/openfinance/accounts/{account_id}/balance";
/// The route for applying a credit or debit to an account.
pub const TRANSACTIONS: &str = "/openfinance/transactions";
/// The route for listing an account's statement, requires consent.
pub const ACCOUNT_TRANSACTIONS: &str = "/openfinance/transactions/{account_id}";
/// The route for creating consents.
pub const CONSENTS: &str = "/openfinance/consents";
/// The route for reading or revoking a single consent.
pub const CONSENT: &str = "/openfinance/consents/{consent_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
