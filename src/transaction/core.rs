//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use time::Date;

use crate::{Error, money::from_cents};

// ============================================================================
// MODELS
// ============================================================================

/// The identifier of a transaction, e.g. `txn_001`.
pub type TransactionId = String;

/// Whether a transaction adds money to or takes money from an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// Money paid into the account.
    Credit,
    /// Money taken out of the account.
    Debit,
}

impl TransactionType {
    /// The lowercase name used in the API and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A credit or debit recorded against an account.
///
/// Transactions are immutable once recorded. The amount is always positive,
/// the direction is given by [Transaction::transaction_type].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The sequential ID of the transaction.
    pub id: TransactionId,
    /// The account the transaction was applied to.
    pub account_id: String,
    /// The calendar date (UTC) on which the transaction was recorded.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The positive amount of money moved, with two decimal places.
    pub amount: Decimal,
    /// Whether the amount was credited or debited.
    pub transaction_type: TransactionType,
    /// A free text label, e.g. "salary" or "groceries".
    pub category: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            type TEXT NOT NULL CHECK (type IN ('credit', 'debit')),
            category TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_id ON \"transaction\"(account_id)",
        (),
    )?;

    Ok(())
}

pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let amount_cents: i64 = row.get(4)?;

    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        amount: from_cents(amount_cents),
        transaction_type: row.get(5)?,
        category: row.get(6)?,
    })
}

/// List the transactions of an account in the order they were recorded.
///
/// An account without transactions, or an unknown account, yields an empty list.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_transactions(
    account_id: &str,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, date, description, amount_cents, type, category
             FROM \"transaction\"
             WHERE account_id = ?1
             ORDER BY rowid ASC",
        )?
        .query_map([account_id], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}
