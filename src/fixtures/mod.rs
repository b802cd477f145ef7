//! Fixtures

use std::{fs, path::PathBuf};

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    bundles::{Catalog, records::BundleRecord},
    cart::{Cart, CartError, CartLineItem},
    fixtures::{
        bundles::BundlesFixture,
        carts::{CartFixture, parse_currency, parse_price},
    },
};

pub mod bundles;
pub mod carts;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Currency mismatch between cart lines
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No cart loaded yet
    #[error("No cart loaded yet; currency unknown")]
    NoCurrency,

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Cart lines, in file order
    lines: Vec<CartLineItem<'a>>,

    /// Raw bundle records, in file order
    records: Vec<BundleRecord>,

    /// Instant the cart fixture is priced at
    now: Option<Timestamp>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            lines: Vec::new(),
            records: Vec::new(),
            now: None,
            currency: None,
        }
    }

    /// Load a cart from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the lines
    /// are in more than one currency.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("carts").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        if let Some(code) = &fixture.currency {
            self.set_currency(parse_currency(code)?)?;
        }

        if let Some(now) = &fixture.now {
            self.now = Some(
                now.parse()
                    .map_err(|_err| FixtureError::InvalidTimestamp(now.clone()))?,
            );
        }

        for line in fixture.lines {
            let (minor_units, currency) = parse_price(&line.price)?;

            self.set_currency(currency)?;

            self.lines.push(CartLineItem::new(
                line.product,
                line.name,
                Money::from_minor(minor_units, currency),
                line.quantity,
            ));
        }

        Ok(self)
    }

    /// Load bundle records from a YAML fixture file
    ///
    /// Records that cannot be read are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a bundle list.
    pub fn load_bundles(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("bundles").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: BundlesFixture = serde_norway::from_str(&contents)?;

        self.records.extend(fixture.into_records());

        Ok(self)
    }

    /// Load a complete fixture set (cart and bundles with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_cart(name)?.load_bundles(name)?;

        Ok(fixture)
    }

    fn set_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            _ => {
                self.currency = Some(currency);
                Ok(())
            }
        }
    }

    /// Create a cart from the loaded lines
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded or the lines do not form a valid cart.
    pub fn cart(&self) -> Result<Cart<'a>, FixtureError> {
        let currency = self.currency()?;

        Ok(Cart::with_items(self.lines.clone(), currency)?)
    }

    /// Create a catalog from the loaded bundle records, dropping malformed ones
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded, as the catalog currency is
    /// taken from the cart.
    pub fn catalog(&self) -> Result<Catalog<'a>, FixtureError> {
        let currency = self.currency()?;

        Ok(Catalog::from_records(self.records.iter().cloned(), currency))
    }

    /// Get all bundle records
    pub fn records(&self) -> &[BundleRecord] {
        &self.records
    }

    /// Instant the cart fixture is priced at, if it names one
    pub fn now(&self) -> Option<Timestamp> {
        self.now
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
