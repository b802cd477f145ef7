//! Bundle Records
//!
//! The loose shape bundle definitions arrive in from the catalog store. Every
//! field is optional and quantities are signed so that a malformed record can
//! still be read and then rejected, rather than failing the whole catalog.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    bundles::{BundleDefinition, BundleDefinitionError, BundleRequirement, ValidityWindow},
    discounts::{BundleDiscount, DiscountKind, major_to_minor},
    products::ProductId,
};

/// A bundle definition as delivered by the catalog store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BundleRecord {
    /// Bundle identifier
    pub id: Option<String>,

    /// Display name
    pub name: Option<String>,

    /// One of `percentage`, `fixed` or `buy_x_get_y`
    pub discount_kind: Option<String>,

    /// Percent points, major currency units or free units, depending on the kind
    pub discount_value: Option<f64>,

    /// Minimum qualifying quantity
    pub min_quantity: Option<i64>,

    /// Maximum number of units the discount is sized on
    pub max_quantity: Option<i64>,

    /// Whether the bundle is switched on
    pub is_active: Option<bool>,

    /// RFC 3339 start of validity
    pub valid_from: Option<String>,

    /// RFC 3339 end of validity
    pub valid_until: Option<String>,

    /// Product requirements
    pub requirements: Option<Vec<RequirementRecord>>,
}

/// A product requirement as delivered by the catalog store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequirementRecord {
    /// Product identifier
    pub product_id: Option<String>,

    /// Units required for one bundle set
    pub required_quantity: Option<i64>,

    /// Whether the requirement gates eligibility (defaults to true)
    pub is_required: Option<bool>,

    /// Reference unit price in major currency units
    pub reference_price: Option<f64>,
}

impl BundleRecord {
    /// Convert the record into a validated bundle definition priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleDefinitionError`] describing the first problem found.
    pub fn into_definition<'a>(
        self,
        currency: &'a Currency,
    ) -> Result<BundleDefinition<'a>, BundleDefinitionError> {
        let id = self.id.ok_or(BundleDefinitionError::MissingField("id"))?;
        let name = self.name.ok_or(BundleDefinitionError::MissingField("name"))?;

        let kind: DiscountKind = self
            .discount_kind
            .ok_or(BundleDefinitionError::MissingField("discount_kind"))?
            .parse()?;

        let value = self
            .discount_value
            .ok_or(BundleDefinitionError::MissingField("discount_value"))?;

        let discount = discount_from_value(kind, value, currency)?;

        let is_active = self
            .is_active
            .ok_or(BundleDefinitionError::MissingField("is_active"))?;

        let valid_from = parse_timestamp(
            "valid_from",
            self.valid_from
                .ok_or(BundleDefinitionError::MissingField("valid_from"))?,
        )?;

        let window = match self.valid_until {
            Some(until) => {
                ValidityWindow::between(valid_from, parse_timestamp("valid_until", until)?)
            }
            None => ValidityWindow::starting(valid_from),
        };

        let min_quantity = positive_quantity(
            "min_quantity",
            self.min_quantity
                .ok_or(BundleDefinitionError::MissingField("min_quantity"))?,
        )?;

        let mut definition = BundleDefinition::new(id, name, discount, window)
            .with_min_quantity(min_quantity)
            .with_active(is_active);

        if let Some(max) = self.max_quantity {
            definition = definition.with_max_quantity(positive_quantity("max_quantity", max)?);
        }

        let requirements = self
            .requirements
            .ok_or(BundleDefinitionError::MissingField("requirements"))?;

        for (idx, record) in requirements.into_iter().enumerate() {
            definition = definition.with_requirement(record.into_requirement(idx, currency)?);
        }

        definition.validate()?;

        Ok(definition)
    }
}

impl RequirementRecord {
    fn into_requirement(
        self,
        idx: usize,
        currency: &Currency,
    ) -> Result<BundleRequirement<'_>, BundleDefinitionError> {
        let product = self
            .product_id
            .map(ProductId::from)
            .ok_or(BundleDefinitionError::MissingProduct(idx))?;

        let quantity = positive_quantity(
            "required_quantity",
            self.required_quantity
                .ok_or(BundleDefinitionError::MissingField("required_quantity"))?,
        )?;

        let requirement = if self.is_required.unwrap_or(true) {
            BundleRequirement::required(product, quantity)
        } else {
            BundleRequirement::optional(product, quantity)
        };

        match self.reference_price {
            Some(price) => {
                let minor = major_to_minor(finite_decimal(price)?, currency)?;

                Ok(requirement.with_reference_price(Money::from_minor(minor, currency)))
            }
            None => Ok(requirement),
        }
    }
}

fn discount_from_value(
    kind: DiscountKind,
    value: f64,
    currency: &Currency,
) -> Result<BundleDiscount<'_>, BundleDefinitionError> {
    let value = finite_decimal(value)?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(BundleDefinitionError::InvalidDiscountValue(value.to_string()));
    }

    match kind {
        DiscountKind::Percentage => {
            if value > Decimal::ONE_HUNDRED {
                return Err(BundleDefinitionError::PercentageOutOfRange);
            }

            Ok(BundleDiscount::Percentage(Percentage::from(
                value / Decimal::ONE_HUNDRED,
            )))
        }
        DiscountKind::Fixed => Ok(BundleDiscount::Fixed(Money::from_minor(
            major_to_minor(value, currency)?,
            currency,
        ))),
        DiscountKind::BuyXGetY => {
            if !value.fract().is_zero() {
                return Err(BundleDefinitionError::InvalidDiscountValue(value.to_string()));
            }

            let free_units = value
                .to_u32()
                .ok_or_else(|| BundleDefinitionError::InvalidDiscountValue(value.to_string()))?;

            Ok(BundleDiscount::BuyXGetY { free_units })
        }
    }
}

fn finite_decimal(value: f64) -> Result<Decimal, BundleDefinitionError> {
    Decimal::from_f64(value)
        .ok_or_else(|| BundleDefinitionError::InvalidDiscountValue(value.to_string()))
}

fn positive_quantity(field: &'static str, value: i64) -> Result<u32, BundleDefinitionError> {
    u32::try_from(value)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or(BundleDefinitionError::InvalidQuantity { field, value })
}

fn parse_timestamp(field: &'static str, value: String) -> Result<Timestamp, BundleDefinitionError> {
    value
        .parse()
        .map_err(|_err| BundleDefinitionError::InvalidTimestamp { field, value })
}
