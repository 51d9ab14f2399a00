//! Human-readable sequential identifiers such as `cus_001` and `txn_042`.
//!
//! Each entity type has its own counter row in the `id_sequence` table. The
//! counter is bumped with a single upsert, so when it runs inside a write
//! transaction no two callers can be handed the same number, and a rolled back
//! transaction also rolls back its number.

use rusqlite::Connection;

use crate::Error;

/// The kinds of records that get sequential identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A registered customer, `cus_NNN`.
    Customer,
    /// A bank account, `acc_NNN`.
    Account,
    /// A credit or debit, `txn_NNN`.
    Transaction,
    /// A data-sharing consent, `con_NNN`.
    Consent,
}

impl Entity {
    /// The prefix placed before the sequence number.
    pub fn prefix(self) -> &'static str {
        match self {
            Entity::Customer => "cus",
            Entity::Account => "acc",
            Entity::Transaction => "txn",
            Entity::Consent => "con",
        }
    }

    /// Format the `n`th identifier for this entity, zero-padded to three digits.
    pub fn format_id(self, n: i64) -> String {
        format!("{}_{n:03}", self.prefix())
    }
}

pub fn create_id_sequence_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS id_sequence (
            entity TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Reserve the next identifier for `entity`.
///
/// Call this on the same connection (or transaction) that inserts the record so
/// that the counter and the record commit or roll back together.
///
/// # Errors
/// Returns [Error::SqlError] if the counter could not be updated.
pub fn next_id(connection: &Connection, entity: Entity) -> Result<String, Error> {
    let value: i64 = connection.query_row(
        "INSERT INTO id_sequence (entity, value) VALUES (?1, 1)
         ON CONFLICT(entity) DO UPDATE SET value = value + 1
         RETURNING value",
        [entity.prefix()],
        |row| row.get(0),
    )?;

    Ok(entity.format_id(value))
}
