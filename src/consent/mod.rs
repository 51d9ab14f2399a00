mod core;
mod create_endpoint;
mod gate;
mod get_endpoint;

pub use core::{
    Consent, ConsentId, ConsentStatus, create_consent, create_consent_table, find_active_consent,
    get_consent, revoke_consent,
};
pub use create_endpoint::{ConsentResponse, create_consent_endpoint};
pub use gate::{ConsentDecision, DenyReason, authorize, consent_guard};
pub use get_endpoint::{get_consent_endpoint, revoke_consent_endpoint};
