//! Prices

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::cart::CartLineItem;

/// Errors that can occur while calculating total price.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// Multiplying a unit price by its quantity overflowed.
    #[error("line total overflowed: {quantity} x {minor_units} minor units")]
    Overflow {
        /// Unit price in minor units
        minor_units: i64,

        /// Quantity on the line
        quantity: u32,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Multiply an amount in minor units by a quantity, returning `None` on overflow.
pub fn multiply_minor(minor_units: i64, quantity: u32) -> Option<i64> {
    minor_units.checked_mul(i64::from(quantity))
}

/// Calculates the total price of a single cart line (unit price × quantity).
///
/// # Errors
///
/// - [`TotalPriceError::Overflow`]: the line total does not fit in minor units.
pub fn line_total<'a>(line: &CartLineItem<'a>) -> Result<Money<'a, Currency>, TotalPriceError> {
    let minor_units = line.unit_price().to_minor_units();

    let total = multiply_minor(minor_units, line.quantity()).ok_or(TotalPriceError::Overflow {
        minor_units,
        quantity: line.quantity(),
    })?;

    Ok(Money::from_minor(total, line.unit_price().currency()))
}

/// Calculates the total price of a list of cart lines.
///
/// # Errors
///
/// - [`TotalPriceError::Overflow`]: a line total does not fit in minor units.
/// - [`TotalPriceError::Money`]: Wrapped money arithmetic or currency mismatch error.
pub fn total_price<'a>(
    lines: &[CartLineItem<'a>],
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, TotalPriceError> {
    lines
        .iter()
        .try_fold(Money::from_minor(0, currency), |acc, line| {
            Ok(acc.add(line_total(line)?)?)
        })
}

/// Total number of units across all cart lines.
pub fn item_count(lines: &[CartLineItem<'_>]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity())).sum()
}
