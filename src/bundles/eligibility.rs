//! Eligibility
//!
//! Decides which catalog bundles apply to a cart at a point in time, and how
//! many units of each matched line the bundle gets to discount.

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    bundles::{
        BundleDefinition, BundleDefinitionError, BundleKey, Catalog, footprint::Footprint,
    },
    cart::Cart,
    products::ProductId,
};

/// Reasons a bundle does not apply to a cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Ineligible {
    /// The bundle is switched off.
    #[error("bundle is inactive")]
    Inactive,

    /// The validity window has not started.
    #[error("bundle is not valid until {0}")]
    NotYetValid(Timestamp),

    /// The validity window has ended.
    #[error("bundle expired at {0}")]
    Expired(Timestamp),

    /// The bundle prices amounts in a different currency from the cart.
    #[error("bundle is priced in {actual}, but cart is in {expected}")]
    CurrencyMismatch {
        /// Cart currency
        expected: &'static str,

        /// Bundle currency
        actual: &'static str,
    },

    /// A required product is not in the cart.
    #[error("required product {0} is not in the cart")]
    MissingProduct(ProductId),

    /// A required product is in the cart, but not enough of it.
    #[error("required product {product} has {available} of {required} units")]
    RequirementShort {
        /// Required product
        product: ProductId,

        /// Units the requirement asks for
        required: u32,

        /// Units in the cart
        available: u32,
    },

    /// The qualifying quantity is below the bundle minimum.
    #[error("qualifying quantity {qualifying} is below minimum {minimum}")]
    BelowMinimum {
        /// Total cart quantity of the required products
        qualifying: u64,

        /// Bundle minimum
        minimum: u32,
    },
}

/// A cart line matched by one of a bundle's requirements.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedLine<'a> {
    product: ProductId,
    cart_quantity: u32,
    effective_quantity: u32,
    unit_price: Money<'a, Currency>,
    is_required: bool,
}

impl<'a> MatchedLine<'a> {
    /// Matched product
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Units of the product in the cart
    pub fn cart_quantity(&self) -> u32 {
        self.cart_quantity
    }

    /// Units the bundle prices, after the `max_quantity` cap
    pub fn effective_quantity(&self) -> u32 {
        self.effective_quantity
    }

    /// Unit price the bundle prices at (reference price or cart price)
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Whether the line came from a required requirement
    pub fn is_required(&self) -> bool {
        self.is_required
    }
}

/// A bundle that applies to a cart, with the lines it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleBundle<'a> {
    key: BundleKey,
    bundle: Arc<BundleDefinition<'a>>,
    lines: SmallVec<[MatchedLine<'a>; 4]>,
    qualifying_quantity: u64,
    footprint: Footprint,
}

impl<'a> EligibleBundle<'a> {
    /// Catalog key of the bundle
    pub fn key(&self) -> BundleKey {
        self.key
    }

    /// Bundle definition
    pub fn bundle(&self) -> &BundleDefinition<'a> {
        &self.bundle
    }

    /// Matched lines, required first, in requirement order
    pub fn lines(&self) -> &[MatchedLine<'a>] {
        &self.lines
    }

    /// Effective units across the required lines
    pub fn qualifying_quantity(&self) -> u64 {
        self.qualifying_quantity
    }

    /// Products this bundle consumes
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }
}

/// Check whether a single bundle applies to the cart at `now`.
///
/// # Errors
///
/// Returns the first [`Ineligible`] rule the bundle fails.
pub fn check_eligibility<'a>(
    cart: &Cart<'a>,
    key: BundleKey,
    bundle: &Arc<BundleDefinition<'a>>,
    now: Timestamp,
) -> Result<EligibleBundle<'a>, Ineligible> {
    if !bundle.is_active() {
        return Err(Ineligible::Inactive);
    }

    let window = bundle.window();

    if !window.contains(now) {
        return Err(match window.valid_until() {
            Some(until) if now > until => Ineligible::Expired(until),
            _ => Ineligible::NotYetValid(window.valid_from()),
        });
    }

    if let Err(BundleDefinitionError::CurrencyMismatch { expected, actual }) =
        bundle.ensure_currency(cart.currency())
    {
        return Err(Ineligible::CurrencyMismatch { expected, actual });
    }

    let mut seen = Footprint::new();
    let mut required = SmallVec::<[MatchedLine<'a>; 4]>::new();
    let mut optional = SmallVec::<[MatchedLine<'a>; 4]>::new();
    let mut qualifying = 0_u64;

    for requirement in bundle.requirements() {
        // Repeated products are matched by their first requirement only
        if seen.contains(requirement.product()) {
            continue;
        }

        seen.insert(requirement.product().clone());

        let line = cart.get(requirement.product());

        if requirement.is_required() {
            let line =
                line.ok_or_else(|| Ineligible::MissingProduct(requirement.product().clone()))?;

            if line.quantity() < requirement.required_quantity() {
                return Err(Ineligible::RequirementShort {
                    product: requirement.product().clone(),
                    required: requirement.required_quantity(),
                    available: line.quantity(),
                });
            }

            qualifying += u64::from(line.quantity());
        }

        let Some(line) = line.filter(|line| line.quantity() >= requirement.required_quantity())
        else {
            continue;
        };

        let matched = MatchedLine {
            product: requirement.product().clone(),
            cart_quantity: line.quantity(),
            effective_quantity: line.quantity(),
            unit_price: requirement
                .reference_price()
                .copied()
                .unwrap_or(*line.unit_price()),
            is_required: requirement.is_required(),
        };

        if requirement.is_required() {
            required.push(matched);
        } else {
            optional.push(matched);
        }
    }

    if qualifying < u64::from(bundle.min_quantity()) {
        return Err(Ineligible::BelowMinimum {
            qualifying,
            minimum: bundle.min_quantity(),
        });
    }

    let mut remaining = bundle.max_quantity();

    for line in &mut required {
        line.effective_quantity = allocate(&mut remaining, line.cart_quantity);
    }

    for line in &mut optional {
        line.effective_quantity = allocate(&mut remaining, line.cart_quantity);
    }

    optional.retain(|line| line.effective_quantity > 0);

    let qualifying_quantity = required
        .iter()
        .map(|line| u64::from(line.effective_quantity))
        .sum();

    let lines: SmallVec<[MatchedLine<'a>; 4]> = required.into_iter().chain(optional).collect();

    let footprint = lines
        .iter()
        .filter(|line| line.effective_quantity > 0)
        .map(|line| line.product.clone())
        .collect();

    Ok(EligibleBundle {
        key,
        bundle: Arc::clone(bundle),
        lines,
        qualifying_quantity,
        footprint,
    })
}

/// Take up to `wanted` units from the remaining allowance.
fn allocate(remaining: &mut Option<u32>, wanted: u32) -> u32 {
    match remaining {
        Some(left) => {
            let taken = wanted.min(*left);
            *left -= taken;
            taken
        }
        None => wanted,
    }
}

/// Every bundle in the catalog that applies to the cart at `now`, in catalog order.
pub fn filter_eligible<'a>(
    cart: &Cart<'a>,
    catalog: &Catalog<'a>,
    now: Timestamp,
) -> Vec<EligibleBundle<'a>> {
    catalog
        .iter()
        .filter_map(
            |(key, bundle)| match check_eligibility(cart, key, bundle, now) {
                Ok(eligible) => Some(eligible),
                Err(reason) => {
                    debug!(bundle_id = bundle.id(), %reason, "bundle not eligible");
                    None
                }
            },
        )
        .collect()
}
