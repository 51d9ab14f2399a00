//! Consent records: a customer's time-limited authorization to share their account data.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    customer::get_customer,
    id_sequence::{Entity, next_id},
};

/// The identifier of a consent, e.g. `con_001`.
pub type ConsentId = String;

/// The lifecycle state of a consent.
///
/// A consent starts out authorized and can be revoked exactly once. It never
/// goes back to being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentStatus {
    /// The customer allows their data to be shared.
    Authorized,
    /// The customer withdrew the consent.
    Revoked,
}

impl ConsentStatus {
    /// The uppercase name used in the API and the database.
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentStatus::Authorized => "AUTHORIZED",
            ConsentStatus::Revoked => "REVOKED",
        }
    }
}

impl Display for ConsentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTHORIZED" => Ok(ConsentStatus::Authorized),
            "REVOKED" => Ok(ConsentStatus::Revoked),
            other => Err(format!("unknown consent status {other}")),
        }
    }
}

impl ToSql for ConsentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ConsentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A customer's authorization to share their account data.
#[derive(Debug, Clone, PartialEq)]
pub struct Consent {
    /// The sequential ID of the consent.
    pub id: ConsentId,
    /// The customer that gave the consent.
    pub customer_id: String,
    /// The capabilities granted, e.g. `READ_BALANCES`, in the order given.
    pub permissions: Vec<String>,
    /// Whether the consent is still authorized.
    pub status: ConsentStatus,
    /// When the consent was given.
    pub created_at: OffsetDateTime,
    /// When the consent stops being valid, one calendar year after creation.
    pub expires_at: OffsetDateTime,
    /// When the consent was last changed.
    pub updated_at: OffsetDateTime,
}

/// The same instant one calendar year later.
///
/// 29 February maps to 28 February of the following year.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the following year is not representable.
fn one_calendar_year_after(datetime: OffsetDateTime) -> Result<OffsetDateTime, Error> {
    let year = datetime.year() + 1;

    datetime
        .replace_year(year)
        .or_else(|_| {
            Date::from_calendar_date(year, Month::February, 28).map(|date| datetime.replace_date(date))
        })
        .map_err(|error| Error::DateOutOfRange(error.to_string()))
}

pub fn create_consent_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS consent (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            permissions TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('AUTHORIZED', 'REVOKED')),
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY(customer_id) REFERENCES customer(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_consent_customer_status ON consent(customer_id, status)",
        (),
    )?;

    Ok(())
}

fn get_timestamp(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let timestamp: i64 = row.get(index)?;

    OffsetDateTime::from_unix_timestamp(timestamp).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

pub fn map_row_to_consent(row: &Row) -> Result<Consent, rusqlite::Error> {
    let raw_permissions: String = row.get(2)?;
    let permissions = serde_json::from_str(&raw_permissions).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error))
    })?;

    Ok(Consent {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        permissions,
        status: row.get(3)?,
        created_at: get_timestamp(row, 4)?,
        expires_at: get_timestamp(row, 5)?,
        updated_at: get_timestamp(row, 6)?,
    })
}

const CONSENT_COLUMNS: &str =
    "id, customer_id, permissions, status, created_at, expires_at, updated_at";

/// Record a new, authorized consent for a customer that expires one calendar year after `now`.
///
/// Earlier consents of the customer are left as they are, so a customer may
/// hold several active consents at once.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if `permissions` is empty or contains a blank tag,
/// - [Error::CustomerNotFound] if the customer does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_consent(
    customer_id: &str,
    permissions: Vec<String>,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Consent, Error> {
    if permissions.is_empty() {
        return Err(Error::InvalidField {
            field: "permissions",
            reason: "must be a non-empty list".to_owned(),
        });
    }

    if permissions.iter().any(|permission| permission.trim().is_empty()) {
        return Err(Error::InvalidField {
            field: "permissions",
            reason: "must not contain blank permissions".to_owned(),
        });
    }

    let expires_at = one_calendar_year_after(now)?;
    let permissions = serde_json::to_string(&permissions)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    get_customer(customer_id, &transaction)?;

    let id = next_id(&transaction, Entity::Consent)?;

    let consent = transaction
        .prepare(&format!(
            "INSERT INTO consent ({CONSENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5)
             RETURNING {CONSENT_COLUMNS}"
        ))?
        .query_row(
            params![
                id,
                customer_id,
                permissions,
                ConsentStatus::Authorized,
                now.unix_timestamp(),
                expires_at.unix_timestamp()
            ],
            map_row_to_consent,
        )?;

    transaction.commit()?;

    tracing::info!(
        "Customer {} authorized consent {} until {}",
        consent.customer_id,
        consent.id,
        consent.expires_at
    );

    Ok(consent)
}

/// Retrieve a consent by its ID.
///
/// # Errors
/// Returns [Error::ConsentNotFound] if there is no such consent.
pub fn get_consent(id: &str, connection: &Connection) -> Result<Consent, Error> {
    connection
        .query_row(
            &format!("SELECT {CONSENT_COLUMNS} FROM consent WHERE id = ?1"),
            [id],
            map_row_to_consent,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ConsentNotFound,
            error => error.into(),
        })
}

/// Find the most recently created consent of a customer that is active at `now`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn find_active_consent(
    customer_id: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Option<Consent>, Error> {
    let consent = connection
        .query_row(
            &format!(
                "SELECT {CONSENT_COLUMNS} FROM consent
                 WHERE customer_id = ?1 AND status = ?2 AND expires_at > ?3
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1"
            ),
            params![customer_id, ConsentStatus::Authorized, now.unix_timestamp()],
            map_row_to_consent,
        )
        .optional()?;

    Ok(consent)
}

/// Revoke a consent so that it no longer grants access.
///
/// # Errors
/// This function will return a:
/// - [Error::ConsentNotFound] if there is no such consent,
/// - [Error::ConsentAlreadyRevoked] if the consent was revoked before,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn revoke_consent(
    id: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Consent, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let consent = get_consent(id, &transaction)?;
    if consent.status == ConsentStatus::Revoked {
        return Err(Error::ConsentAlreadyRevoked);
    }

    let revoked = transaction
        .prepare(&format!(
            "UPDATE consent SET status = ?1, updated_at = ?2 WHERE id = ?3
             RETURNING {CONSENT_COLUMNS}"
        ))?
        .query_row(
            params![ConsentStatus::Revoked, now.unix_timestamp(), id],
            map_row_to_consent,
        )?;

    transaction.commit()?;

    tracing::info!(
        "Consent {} of customer {} revoked",
        revoked.id,
        revoked.customer_id
    );

    Ok(revoked)
}
