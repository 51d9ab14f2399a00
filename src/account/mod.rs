mod balance_endpoint;
mod core;
mod create_endpoint;

pub use balance_endpoint::get_balance_endpoint;
pub(crate) use core::set_balance;
pub use core::{Account, AccountId, NewAccount, create_account, create_account_table, get_account};
pub use create_endpoint::{AccountResponse, create_account_endpoint};
