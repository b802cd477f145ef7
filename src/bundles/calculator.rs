//! Bundle Calculator
//!
//! Prices an eligible bundle: what its matched lines cost at full price, and
//! how much the bundle takes off.

use rusty_money::{Money, iso::Currency};

use crate::{
    bundles::eligibility::{EligibleBundle, MatchedLine},
    discounts::{BundleDiscount, DiscountError, clamp_discount, percent_of_minor},
    pricing::multiply_minor,
};

/// An eligible bundle with its price and discount.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedBundle<'a> {
    eligible: EligibleBundle<'a>,
    original_price: Money<'a, Currency>,
    discount: Money<'a, Currency>,
    discounted_price: Money<'a, Currency>,
}

impl<'a> PricedBundle<'a> {
    /// The eligible bundle that was priced
    pub fn eligible(&self) -> &EligibleBundle<'a> {
        &self.eligible
    }

    /// Full price of the matched units
    pub fn original_price(&self) -> &Money<'a, Currency> {
        &self.original_price
    }

    /// Amount taken off by the bundle
    pub fn discount(&self) -> &Money<'a, Currency> {
        &self.discount
    }

    /// Price of the matched units after the discount
    pub fn discounted_price(&self) -> &Money<'a, Currency> {
        &self.discounted_price
    }
}

/// Price an eligible bundle.
///
/// # Errors
///
/// - [`DiscountError::NoItems`]: the bundle matched no lines.
/// - [`DiscountError::Overflow`]: a price does not fit in minor units.
/// - [`DiscountError::PercentConversion`]: the percentage could not be applied.
pub fn price_bundle(eligible: EligibleBundle<'_>) -> Result<PricedBundle<'_>, DiscountError> {
    let currency = eligible
        .lines()
        .first()
        .map(|line| line.unit_price().currency())
        .ok_or(DiscountError::NoItems)?;

    let original_minor = eligible
        .lines()
        .iter()
        .try_fold(0_i64, |acc, line| acc.checked_add(priced_minor(line)?))
        .ok_or(DiscountError::Overflow)?;

    let discount_minor = match eligible.bundle().discount() {
        BundleDiscount::Percentage(percent) => percent_of_minor(percent, original_minor)?,
        // Eligibility has already checked the amount is in the cart currency
        BundleDiscount::Fixed(amount) => amount.to_minor_units(),
        BundleDiscount::BuyXGetY { free_units } => free_units_discount(&eligible, *free_units)?,
    };

    let discount_minor = clamp_discount(discount_minor, original_minor);

    Ok(PricedBundle {
        original_price: Money::from_minor(original_minor, currency),
        discount: Money::from_minor(discount_minor, currency),
        discounted_price: Money::from_minor(original_minor - discount_minor, currency),
        eligible,
    })
}

fn priced_minor(line: &MatchedLine<'_>) -> Option<i64> {
    multiply_minor(line.unit_price().to_minor_units(), line.effective_quantity())
}

/// For every complete group of `min_quantity` qualifying units, `free_units`
/// units are free, priced at the cheapest required unit.
fn free_units_discount(eligible: &EligibleBundle<'_>, free_units: u32) -> Result<i64, DiscountError> {
    let qualifying = eligible.qualifying_quantity();
    let groups = qualifying / u64::from(eligible.bundle().min_quantity().max(1));

    let free = groups
        .checked_mul(u64::from(free_units))
        .ok_or(DiscountError::Overflow)?
        .min(qualifying);

    let cheapest = eligible
        .lines()
        .iter()
        .filter(|line| line.is_required() && line.effective_quantity() > 0)
        .map(|line| line.unit_price().to_minor_units())
        .min()
        .unwrap_or(0);

    i64::try_from(free)
        .ok()
        .and_then(|free| free.checked_mul(cheapest))
        .ok_or(DiscountError::Overflow)
}
