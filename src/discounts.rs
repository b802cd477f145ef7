//! Discounts
//!
//! Discount configuration for bundles and the shared arithmetic used to size
//! them in minor units.

use std::{fmt, str::FromStr};

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// No priced lines, so currency cannot be determined.
    #[error("no items provided; cannot determine currency for discount")]
    NoItems,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Integer arithmetic on minor units overflowed.
    #[error("discount arithmetic overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// The kind of discount a bundle grants.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiscountKind {
    /// Percentage off the bundle's original price
    Percentage,

    /// Fixed amount off the bundle's original price
    Fixed,

    /// Free units for every complete paid group
    BuyXGetY,
}

impl DiscountKind {
    /// Wire name of the discount kind.
    pub fn as_str(self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
            DiscountKind::BuyXGetY => "buy_x_get_y",
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a discount kind name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown discount kind: {0}")]
pub struct UnknownDiscountKind(pub String);

impl FromStr for DiscountKind {
    type Err = UnknownDiscountKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            "buy_x_get_y" => Ok(DiscountKind::BuyXGetY),
            other => Err(UnknownDiscountKind(other.to_string())),
        }
    }
}

/// Discount configuration for a bundle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BundleDiscount<'a> {
    /// Percentage off the bundle's original price (e.g. "20% off")
    Percentage(Percentage),

    /// Fixed amount off the bundle's original price (e.g. "£3 off"), never below zero
    Fixed(Money<'a, Currency>),

    /// For every `min_quantity` units bought, this many units are free
    BuyXGetY {
        /// Free units granted per complete group
        free_units: u32,
    },
}

impl BundleDiscount<'_> {
    /// The kind of this discount.
    pub fn kind(&self) -> DiscountKind {
        match self {
            BundleDiscount::Percentage(_) => DiscountKind::Percentage,
            BundleDiscount::Fixed(_) => DiscountKind::Fixed,
            BundleDiscount::BuyXGetY { .. } => DiscountKind::BuyXGetY,
        }
    }
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Rounds half away from zero.
///
/// # Errors
///
/// Returns an error if:
/// - The percentage calculation overflows or cannot be safely represented (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Convert an amount in major units (e.g. `2.50`) to minor units for a currency.
///
/// Rounds half away from zero at the currency's exponent.
///
/// # Errors
///
/// Returns `DiscountError::Overflow` if the amount does not fit in minor units.
pub fn major_to_minor(amount: Decimal, currency: &Currency) -> Result<i64, DiscountError> {
    let scale = 10_i64
        .checked_pow(currency.exponent)
        .ok_or(DiscountError::Overflow)?;

    amount
        .checked_mul(Decimal::from(scale))
        .ok_or(DiscountError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::Overflow)
}

/// Clamp a discount so it is never negative and never exceeds the original price.
pub fn clamp_discount(discount_minor: i64, original_minor: i64) -> i64 {
    discount_minor.clamp(0, original_minor.max(0))
}
