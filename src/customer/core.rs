use rusqlite::{Connection, Row, Transaction, TransactionBehavior, params};

use crate::{
    Error,
    id_sequence::{Entity, next_id},
};

/// The identifier of a customer, e.g. `cus_001`.
pub type CustomerId = String;

/// A person registered with the institution.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// The sequential ID of the customer.
    pub id: CustomerId,
    /// The customer's full name.
    pub name: String,
    /// The customer's CPF (Brazilian tax ID), unique across customers.
    pub cpf: String,
    /// The customer's email address.
    pub email: String,
    /// Whether the customer ticked the consent box when registering.
    ///
    /// Kept for clients of the registration form only. Access to account data
    /// is governed by consent records, never by this flag.
    pub consent_given: bool,
}

/// The data needed to register a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    /// The customer's full name.
    pub name: String,
    /// The customer's CPF.
    pub cpf: String,
    /// The customer's email address.
    pub email: String,
    /// The legacy consent checkbox.
    pub consent_given: bool,
}

/// Check that `cpf` is made of exactly eleven digits.
///
/// # Errors
/// Returns [Error::InvalidField] otherwise.
pub fn validate_cpf(cpf: &str) -> Result<(), Error> {
    if cpf.len() == 11 && cpf.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidField {
            field: "cpf",
            reason: "a CPF must contain exactly 11 digits".to_owned(),
        })
    }
}

pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customer (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cpf TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            consent_given INTEGER NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_customer(row: &Row) -> Result<Customer, rusqlite::Error> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        cpf: row.get(2)?,
        email: row.get(3)?,
        consent_given: row.get(4)?,
    })
}

/// Register a new customer and assign it the next customer ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCpf] if a customer with the same CPF already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_customer(customer: NewCustomer, connection: &Connection) -> Result<Customer, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let id = next_id(&transaction, Entity::Customer)?;

    let customer = transaction
        .prepare(
            "INSERT INTO customer (id, name, cpf, email, consent_given)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, name, cpf, email, consent_given",
        )?
        .query_row(
            params![
                id,
                customer.name,
                customer.cpf,
                customer.email,
                customer.consent_given
            ],
            map_row_to_customer,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateCpf,
            error => error.into(),
        })?;

    transaction.commit()?;

    tracing::info!("Registered customer {}", customer.id);

    Ok(customer)
}

/// Retrieve a customer by its ID.
///
/// # Errors
/// Returns [Error::CustomerNotFound] if there is no such customer.
pub fn get_customer(id: &str, connection: &Connection) -> Result<Customer, Error> {
    connection
        .query_row(
            "SELECT id, name, cpf, email, consent_given FROM customer WHERE id = ?1",
            [id],
            map_row_to_customer,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CustomerNotFound,
            error => error.into(),
        })
}

/// Retrieve a customer by their CPF.
///
/// # Errors
/// Returns [Error::CustomerNotFound] if no customer has that CPF.
pub fn get_customer_by_cpf(cpf: &str, connection: &Connection) -> Result<Customer, Error> {
    connection
        .query_row(
            "SELECT id, name, cpf, email, consent_given FROM customer WHERE cpf = ?1",
            [cpf],
            map_row_to_customer,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CustomerNotFound,
            error => error.into(),
        })
}
