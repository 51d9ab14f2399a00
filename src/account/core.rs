use rusqlite::{Connection, Row, Transaction, TransactionBehavior, params};
use rust_decimal::Decimal;

use crate::{
    Error,
    customer::get_customer,
    id_sequence::{Entity, next_id},
    money::{from_cents, to_cents},
};

/// The identifier of an account, e.g. `acc_001`.
pub type AccountId = String;

/// A bank account owned by a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The sequential ID of the account.
    pub id: AccountId,
    /// The customer that owns the account.
    pub customer_id: String,
    /// The kind of account, e.g. "checking" or "savings".
    pub account_type: String,
    /// The branch (agency) the account belongs to.
    pub branch: String,
    /// The account number within the branch.
    pub number: String,
    /// The running balance, always the signed sum of the account's transactions.
    pub balance: Decimal,
}

/// The data needed to open an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The customer that will own the account.
    pub customer_id: String,
    /// The kind of account.
    pub account_type: String,
    /// The branch the account belongs to.
    pub branch: String,
    /// The account number.
    pub number: String,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            type TEXT NOT NULL,
            branch TEXT NOT NULL,
            number TEXT NOT NULL,
            balance_cents INTEGER NOT NULL DEFAULT 0 CHECK (balance_cents >= 0),
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            FOREIGN KEY(customer_id) REFERENCES customer(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_customer_id ON account(customer_id)",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let balance_cents: i64 = row.get(5)?;

    Ok(Account {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        account_type: row.get(2)?,
        branch: row.get(3)?,
        number: row.get(4)?,
        balance: from_cents(balance_cents),
    })
}

/// Open a new account with a zero balance for an existing customer.
///
/// # Errors
/// This function will return a:
/// - [Error::CustomerNotFound] if `account.customer_id` does not refer to a customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    get_customer(&account.customer_id, &transaction)?;

    let id = next_id(&transaction, Entity::Account)?;

    let created = transaction
        .prepare(
            "INSERT INTO account (id, customer_id, type, branch, number, balance_cents)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)
             RETURNING id, customer_id, type, branch, number, balance_cents",
        )?
        .query_row(
            params![
                id,
                account.customer_id,
                account.account_type,
                account.branch,
                account.number
            ],
            map_row_to_account,
        )?;

    transaction.commit()?;

    tracing::info!(
        "Opened account {} for customer {}",
        created.id,
        created.customer_id
    );

    Ok(created)
}

/// Retrieve an account by its ID.
///
/// # Errors
/// Returns [Error::AccountNotFound] if there is no such account.
pub fn get_account(id: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            "SELECT id, customer_id, type, branch, number, balance_cents
             FROM account WHERE id = ?1",
            [id],
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::AccountNotFound,
            error => error.into(),
        })
}

/// Overwrite the stored balance of an account.
///
/// Only the ledger calls this, from inside the write transaction in which it
/// read the old balance and recorded the transaction.
///
/// # Errors
/// Returns [Error::AccountNotFound] if no row was updated, or [Error::SqlError]
/// if the update failed.
pub(crate) fn set_balance(
    account_id: &str,
    balance: Decimal,
    transaction: &Transaction,
) -> Result<(), Error> {
    let rows_affected = transaction.execute(
        "UPDATE account SET balance_cents = ?1 WHERE id = ?2",
        params![to_cents(balance)?, account_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::AccountNotFound);
    }

    Ok(())
}
