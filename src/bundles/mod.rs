//! Bundles
//!
//! Bundle offers tie a discount to specific product combinations and
//! quantities. Definitions are immutable once they enter a [`Catalog`].

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    discounts::{BundleDiscount, DiscountError, DiscountKind, UnknownDiscountKind},
    products::ProductId,
};

pub mod calculator;
pub mod catalog;
pub mod eligibility;
pub mod footprint;
pub mod records;

pub use catalog::Catalog;

new_key_type! {
    /// Bundle Key
    pub struct BundleKey;
}

/// Reasons a bundle definition is malformed.
#[derive(Debug, Error, PartialEq)]
pub enum BundleDefinitionError {
    /// A required field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The discount kind is not one the engine understands.
    #[error(transparent)]
    UnknownDiscountKind(#[from] UnknownDiscountKind),

    /// A quantity field was zero or negative.
    #[error("{field} must be at least 1, got {value}")]
    InvalidQuantity {
        /// Name of the offending field
        field: &'static str,

        /// Value supplied
        value: i64,
    },

    /// The discount value was negative or not a finite number.
    #[error("invalid discount value: {0}")]
    InvalidDiscountValue(String),

    /// A percentage discount was above 100%.
    #[error("percentage discount exceeds 100%")]
    PercentageOutOfRange,

    /// The bundle has no requirements at all.
    #[error("bundle has no product requirements")]
    NoRequirements,

    /// A requirement did not name a product.
    #[error("requirement {0} has no product id")]
    MissingProduct(usize),

    /// `max_quantity` is lower than `min_quantity`.
    #[error("max quantity {max} is below min quantity {min}")]
    MaxBelowMin {
        /// Minimum quantity
        min: u32,

        /// Maximum quantity
        max: u32,
    },

    /// A timestamp could not be parsed.
    #[error("invalid timestamp for {field}: {value}")]
    InvalidTimestamp {
        /// Name of the offending field
        field: &'static str,

        /// Value supplied
        value: String,
    },

    /// `valid_until` is earlier than `valid_from`.
    #[error("validity window ends before it starts")]
    InvertedWindow,

    /// A money value does not match the catalog currency.
    #[error("currency {actual} does not match catalog currency {expected}")]
    CurrencyMismatch {
        /// Catalog currency
        expected: &'static str,

        /// Currency found on the definition
        actual: &'static str,
    },

    /// Wrapped discount arithmetic error.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// A product line inside a bundle definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleRequirement<'a> {
    product: ProductId,
    required_quantity: u32,
    is_required: bool,
    reference_price: Option<Money<'a, Currency>>,
}

impl<'a> BundleRequirement<'a> {
    /// A requirement that gates eligibility.
    pub fn required(product: impl Into<ProductId>, required_quantity: u32) -> Self {
        Self {
            product: product.into(),
            required_quantity,
            is_required: true,
            reference_price: None,
        }
    }

    /// An optional add-on, priced in when present but never gating eligibility.
    pub fn optional(product: impl Into<ProductId>, required_quantity: u32) -> Self {
        Self {
            is_required: false,
            ..Self::required(product, required_quantity)
        }
    }

    /// Price units at this reference price instead of the cart's unit price.
    #[must_use]
    pub fn with_reference_price(mut self, price: Money<'a, Currency>) -> Self {
        self.reference_price = Some(price);
        self
    }

    /// Product this requirement refers to
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Units of the product required for one bundle set
    pub fn required_quantity(&self) -> u32 {
        self.required_quantity
    }

    /// Whether this requirement gates eligibility
    pub fn is_required(&self) -> bool {
        self.is_required
    }

    /// Reference unit price, if the bundle overrides the cart price
    pub fn reference_price(&self) -> Option<&Money<'a, Currency>> {
        self.reference_price.as_ref()
    }
}

/// The period a bundle is valid for. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    valid_from: Timestamp,
    valid_until: Option<Timestamp>,
}

impl ValidityWindow {
    /// A window with no end.
    pub fn starting(valid_from: Timestamp) -> Self {
        Self {
            valid_from,
            valid_until: None,
        }
    }

    /// A window between two instants.
    pub fn between(valid_from: Timestamp, valid_until: Timestamp) -> Self {
        Self {
            valid_from,
            valid_until: Some(valid_until),
        }
    }

    /// Start of the window
    pub fn valid_from(&self) -> Timestamp {
        self.valid_from
    }

    /// End of the window, if any
    pub fn valid_until(&self) -> Option<Timestamp> {
        self.valid_until
    }

    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        now >= self.valid_from && self.valid_until.is_none_or(|until| now <= until)
    }
}

/// A bundle offer.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleDefinition<'a> {
    id: String,
    name: String,
    discount: BundleDiscount<'a>,
    min_quantity: u32,
    max_quantity: Option<u32>,
    is_active: bool,
    window: ValidityWindow,
    requirements: SmallVec<[BundleRequirement<'a>; 4]>,
}

impl<'a> BundleDefinition<'a> {
    /// Create an active bundle with a minimum quantity of one and no requirements.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        discount: BundleDiscount<'a>,
        window: ValidityWindow,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            discount,
            min_quantity: 1,
            max_quantity: None,
            is_active: true,
            window,
            requirements: SmallVec::new(),
        }
    }

    /// Set the minimum qualifying quantity.
    #[must_use]
    pub fn with_min_quantity(mut self, min_quantity: u32) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    /// Cap the number of units the discount is sized on.
    #[must_use]
    pub fn with_max_quantity(mut self, max_quantity: u32) -> Self {
        self.max_quantity = Some(max_quantity);
        self
    }

    /// Add a product requirement.
    #[must_use]
    pub fn with_requirement(mut self, requirement: BundleRequirement<'a>) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Set whether the bundle is active.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Bundle identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bundle display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discount granted by the bundle
    pub fn discount(&self) -> &BundleDiscount<'a> {
        &self.discount
    }

    /// Minimum qualifying quantity
    pub fn min_quantity(&self) -> u32 {
        self.min_quantity
    }

    /// Maximum number of units the discount is sized on
    pub fn max_quantity(&self) -> Option<u32> {
        self.max_quantity
    }

    /// Whether the bundle is switched on
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Validity window
    pub fn window(&self) -> &ValidityWindow {
        &self.window
    }

    /// Product requirements, in definition order
    pub fn requirements(&self) -> &[BundleRequirement<'a>] {
        &self.requirements
    }

    /// Check the definition is well formed.
    ///
    /// # Errors
    ///
    /// Returns the first [`BundleDefinitionError`] found.
    pub fn validate(&self) -> Result<(), BundleDefinitionError> {
        if self.id.trim().is_empty() {
            return Err(BundleDefinitionError::MissingField("id"));
        }

        if self.min_quantity == 0 {
            return Err(BundleDefinitionError::InvalidQuantity {
                field: "min_quantity",
                value: 0,
            });
        }

        if let Some(max) = self.max_quantity
            && max < self.min_quantity
        {
            return Err(BundleDefinitionError::MaxBelowMin {
                min: self.min_quantity,
                max,
            });
        }

        if let Some(until) = self.window.valid_until
            && until < self.window.valid_from
        {
            return Err(BundleDefinitionError::InvertedWindow);
        }

        self.validate_discount()?;
        self.validate_requirements()
    }

    fn validate_discount(&self) -> Result<(), BundleDefinitionError> {
        match self.discount {
            BundleDiscount::Percentage(percent) => {
                let fraction = percent * Decimal::ONE;

                if fraction.is_sign_negative() {
                    return Err(BundleDefinitionError::InvalidDiscountValue(
                        fraction.to_string(),
                    ));
                }

                if fraction > Decimal::ONE {
                    return Err(BundleDefinitionError::PercentageOutOfRange);
                }
            }
            BundleDiscount::Fixed(amount) => {
                if amount.to_minor_units() < 0 {
                    return Err(BundleDefinitionError::InvalidDiscountValue(
                        amount.to_string(),
                    ));
                }
            }
            BundleDiscount::BuyXGetY { .. } => {}
        }

        Ok(())
    }

    fn validate_requirements(&self) -> Result<(), BundleDefinitionError> {
        if self.requirements.is_empty() {
            return Err(BundleDefinitionError::NoRequirements);
        }

        for (idx, requirement) in self.requirements.iter().enumerate() {
            if requirement.product.is_blank() {
                return Err(BundleDefinitionError::MissingProduct(idx));
            }

            if requirement.required_quantity == 0 {
                return Err(BundleDefinitionError::InvalidQuantity {
                    field: "required_quantity",
                    value: 0,
                });
            }

            if let Some(price) = requirement.reference_price
                && price.to_minor_units() < 0
            {
                return Err(BundleDefinitionError::InvalidDiscountValue(
                    price.to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Check every money value on the definition is in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleDefinitionError::CurrencyMismatch`] on the first mismatch.
    pub fn ensure_currency(&self, currency: &Currency) -> Result<(), BundleDefinitionError> {
        let fixed = match &self.discount {
            BundleDiscount::Fixed(amount) => Some(amount.currency()),
            BundleDiscount::Percentage(_) | BundleDiscount::BuyXGetY { .. } => None,
        };

        let references = self
            .requirements
            .iter()
            .filter_map(|requirement| requirement.reference_price.as_ref().map(Money::currency));

        match fixed.into_iter().chain(references).find(|c| *c != currency) {
            Some(actual) => Err(BundleDefinitionError::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                actual: actual.iso_alpha_code,
            }),
            None => Ok(()),
        }
    }

    /// The kind of discount this bundle grants.
    pub fn discount_kind(&self) -> DiscountKind {
        self.discount.kind()
    }
}
