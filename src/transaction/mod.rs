mod core;
mod create_endpoint;
mod ledger;
mod statement_endpoint;

pub use core::{
    Transaction, TransactionId, TransactionType, create_transaction_table, list_transactions,
    map_transaction_row,
};
pub use create_endpoint::{TransactionResponse, create_transaction_endpoint};
pub use ledger::{TransactionRequest, apply_transaction};
pub use statement_endpoint::get_statement_endpoint;
