//! Applies credits and debits to accounts.
//!
//! Every call to [apply_transaction] is one write-locked database transaction:
//! the account is read, the funds are checked, the transaction row is inserted
//! and the balance is updated, or none of it happens. SQLite has no row locks,
//! so the unit takes the database write lock up front (`BEGIN IMMEDIATE`). Two
//! debits against the same account, even from separate connections, can
//! therefore never both see the old balance.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    account::{get_account, set_balance},
    id_sequence::{Entity, next_id},
    money::{parse_amount, to_cents},
    transaction::{Transaction, TransactionType, map_transaction_row},
};

/// A request to move money into or out of an account.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    /// The account to apply the transaction to.
    pub account_id: String,
    /// What the transaction is for.
    pub description: String,
    /// The positive amount to move, at most two decimal places.
    pub amount: Decimal,
    /// `credit` or `debit`. Checked after the account lookup.
    pub transaction_type: String,
    /// A free text label for the transaction.
    pub category: String,
}

/// Record a transaction against an account and update its balance atomically.
///
/// The transaction is dated `today`. A debit may bring the balance down to
/// exactly zero but never below.
///
/// Failed calls leave the database untouched. Nothing is retried here, since
/// replaying a money movement is not safe without deduplication.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] or [Error::InvalidField] if the request is incomplete
///   or the amount is not a positive two decimal place value,
/// - [Error::AccountNotFound] if the account does not exist,
/// - [Error::InvalidTransactionType] if the type is not `credit` or `debit`,
/// - [Error::InsufficientFunds] if a debit exceeds the current balance,
/// - or [Error::SqlError] if the database fails part way, in which case all
///   changes are rolled back.
pub fn apply_transaction(
    request: TransactionRequest,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = validate(&request)?;

    // Dropping `transaction` without committing rolls everything back.
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let account = get_account(&request.account_id, &transaction)?;
    let transaction_type: TransactionType = request.transaction_type.parse()?;

    let new_balance = match transaction_type {
        TransactionType::Credit => account.balance.checked_add(amount),
        TransactionType::Debit if amount > account.balance => {
            tracing::warn!(
                "Rejected debit of {amount} from account {}: balance is {}",
                account.id,
                account.balance
            );

            return Err(Error::InsufficientFunds {
                account_id: account.id,
                balance: account.balance,
                requested: amount,
            });
        }
        TransactionType::Debit => account.balance.checked_sub(amount),
    }
    .ok_or(Error::InvalidField {
        field: "amount",
        reason: "is too large".to_owned(),
    })?;

    let id = next_id(&transaction, Entity::Transaction)?;

    let recorded = transaction
        .prepare(
            "INSERT INTO \"transaction\" (id, account_id, date, description, amount_cents, type, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, account_id, date, description, amount_cents, type, category",
        )?
        .query_row(
            params![
                id,
                account.id,
                today,
                request.description,
                to_cents(amount)?,
                transaction_type,
                request.category
            ],
            map_transaction_row,
        )?;

    set_balance(&account.id, new_balance, &transaction)?;

    transaction.commit()?;

    tracing::info!(
        "Applied {} {} of {} to account {}, new balance {}",
        recorded.transaction_type,
        recorded.id,
        recorded.amount,
        account.id,
        new_balance
    );

    Ok(recorded)
}

/// Check the request before touching the database and return the normalised amount.
fn validate(request: &TransactionRequest) -> Result<Decimal, Error> {
    if request.account_id.trim().is_empty() {
        return Err(Error::MissingField("accountId"));
    }

    if request.description.trim().is_empty() {
        return Err(Error::MissingField("description"));
    }

    if request.transaction_type.trim().is_empty() {
        return Err(Error::MissingField("type"));
    }

    if request.category.trim().is_empty() {
        return Err(Error::MissingField("category"));
    }

    parse_amount(request.amount)
}
