//! Cart Fixtures

use std::str::FromStr;

use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use serde::Deserialize;

use crate::{discounts::major_to_minor, fixtures::FixtureError};

/// Wrapper for cart lines in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Cart currency, required when the cart has no lines
    #[serde(default)]
    pub currency: Option<String>,

    /// Instant the cart is priced at
    #[serde(default)]
    pub now: Option<String>,

    /// Cart lines
    #[serde(default)]
    pub lines: Vec<LineFixture>,
}

/// Cart line fixture from YAML
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Product identifier
    pub product: String,

    /// Display name
    pub name: String,

    /// Unit price (e.g., "2.99 GBP")
    pub price: String,

    /// Units in the cart
    pub quantity: u32,
}

/// Parse a price string like "2.99 GBP" into minor units and currency
///
/// # Errors
///
/// Returns an error if the price string is not in the correct format, the amount is invalid,
/// or the currency is unknown.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    };

    let currency = parse_currency(code)?;

    let amount = Decimal::from_str(amount).map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units =
        major_to_minor(amount, currency).map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Look up an ISO currency by its alpha code
///
/// # Errors
///
/// Returns an error if the code is not a known ISO currency.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    iso::find(code).ok_or_else(|| FixtureError::UnknownCurrency(code.to_string()))
}
