//! Application router configuration with consent-gated and open route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    account::{create_account_endpoint, get_balance_endpoint},
    consent::{
        consent_guard, create_consent_endpoint, get_consent_endpoint, revoke_consent_endpoint,
    },
    customer::{create_customer_endpoint, lookup_customer_by_cpf_endpoint},
    endpoints,
    logging::logging_middleware,
    not_found::get_404_not_found,
    status::get_api_status,
    transaction::{create_transaction_endpoint, get_statement_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let open_routes = Router::new()
        .route(endpoints::ROOT, get(get_api_status))
        .route(endpoints::API_STATUS, get(get_api_status))
        .route(endpoints::CUSTOMERS, post(create_customer_endpoint))
        .route(
            endpoints::CUSTOMER_BY_CPF,
            get(lookup_customer_by_cpf_endpoint),
        )
        .route(endpoints::ACCOUNTS, post(create_account_endpoint))
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(endpoints::CONSENTS, post(create_consent_endpoint))
        .route(
            endpoints::CONSENT,
            get(get_consent_endpoint).delete(revoke_consent_endpoint),
        );

    // `route_layer` only runs the guard for matched routes.
    let consent_gated_routes = Router::new()
        .route(endpoints::ACCOUNT_BALANCE, get(get_balance_endpoint))
        .route(endpoints::ACCOUNT_TRANSACTIONS, get(get_statement_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            consent_guard,
        ));

    consent_gated_routes
        .merge(open_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
