//! Conversions between decimal money amounts and the integer cents stored in the database.

use rust_decimal::Decimal;

use crate::Error;

/// Number of decimal places used for all money values.
pub const MONEY_SCALE: u32 = 2;

/// Validate a transaction amount from a client and normalise it to two decimal places.
///
/// # Errors
/// Returns [Error::InvalidField] if the amount is not positive or has more
/// than two decimal places.
pub fn parse_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidField {
            field: "amount",
            reason: "must be greater than zero".to_owned(),
        });
    }

    let mut normalized = amount.normalize();
    if normalized.scale() > MONEY_SCALE {
        return Err(Error::InvalidField {
            field: "amount",
            reason: format!("must have at most {MONEY_SCALE} decimal places"),
        });
    }

    normalized.rescale(MONEY_SCALE);
    Ok(normalized)
}

/// Convert a money value into whole cents.
///
/// # Errors
/// Returns [Error::InvalidField] if the value does not fit in the database column.
pub fn to_cents(amount: Decimal) -> Result<i64, Error> {
    let mut amount = amount;
    amount.rescale(MONEY_SCALE);

    i64::try_from(amount.mantissa()).map_err(|_| Error::InvalidField {
        field: "amount",
        reason: "is too large".to_owned(),
    })
}

/// Convert whole cents from the database into a two decimal place money value.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}
