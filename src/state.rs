//! Cart State
//!
//! An immutable snapshot of a cart, the bundle catalog it is priced against
//! and the resulting totals. Every transition goes through [`reduce`], which
//! recomputes the totals from scratch so a snapshot is never stale.

use jiff::Timestamp;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::Span;

use crate::{
    bundles::Catalog,
    cart::{Cart, CartError, CartLineItem},
    engine::{EngineError, compute_totals},
    products::ProductId,
    solvers::Solver,
    totals::CartTotals,
};

/// Errors raised by a cart state transition.
#[derive(Debug, Error)]
pub enum StateError {
    /// The cart rejected the change.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The totals could not be recomputed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A change to the cart or its catalog.
#[derive(Debug, Clone)]
pub enum CartAction<'a> {
    /// Add a line, merging with an existing line for the same product
    AddItem(CartLineItem<'a>),

    /// Remove a product's line
    RemoveItem(ProductId),

    /// Set a product's quantity; zero removes the line
    UpdateQuantity(ProductId, u32),

    /// Empty the cart
    Clear,

    /// Replace the bundle catalog once it has been fetched
    CatalogLoaded(Catalog<'a>),
}

impl CartAction<'_> {
    /// Short name of the action, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            CartAction::AddItem(_) => "add_item",
            CartAction::RemoveItem(_) => "remove_item",
            CartAction::UpdateQuantity(..) => "update_quantity",
            CartAction::Clear => "clear",
            CartAction::CatalogLoaded(_) => "catalog_loaded",
        }
    }
}

/// A cart, its catalog and their totals.
#[derive(Debug, Clone)]
pub struct CartState<'a> {
    cart: Cart<'a>,
    catalog: Catalog<'a>,
    totals: CartTotals<'a>,
}

impl<'a> CartState<'a> {
    /// An empty cart with no catalog loaded.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            cart: Cart::new(currency),
            catalog: Catalog::empty(),
            totals: CartTotals::empty(currency),
        }
    }

    /// Build a state from an existing cart and catalog, computing its totals.
    ///
    /// # Errors
    ///
    /// Returns a [`StateError`] if the totals cannot be computed.
    pub fn with_catalog<S: Solver>(
        cart: Cart<'a>,
        catalog: Catalog<'a>,
        now: Timestamp,
    ) -> Result<Self, StateError> {
        let totals = compute_totals::<S>(&cart, &catalog, now)?;

        Ok(Self {
            cart,
            catalog,
            totals,
        })
    }

    /// Current cart
    pub fn cart(&self) -> &Cart<'a> {
        &self.cart
    }

    /// Current bundle catalog
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// Totals for the current cart and catalog
    pub fn totals(&self) -> &CartTotals<'a> {
        &self.totals
    }
}

/// Apply an action to a state, returning the next state.
///
/// The given state is left untouched, including when the action fails.
///
/// # Errors
///
/// Returns a [`StateError`] if the cart rejects the change or the totals
/// cannot be recomputed.
#[tracing::instrument(
    name = "bundles.state.reduce",
    skip_all,
    fields(
        action = action.name(),
        line_count = tracing::field::Empty,
        final_total = tracing::field::Empty
    ),
    err
)]
pub fn reduce<'a, S: Solver>(
    state: &CartState<'a>,
    action: CartAction<'a>,
    now: Timestamp,
) -> Result<CartState<'a>, StateError> {
    let (cart, catalog) = match action {
        CartAction::AddItem(item) => (state.cart.add_item(item)?, state.catalog.clone()),
        CartAction::RemoveItem(product) => {
            (state.cart.remove_item(&product)?, state.catalog.clone())
        }
        CartAction::UpdateQuantity(product, quantity) => (
            state.cart.update_quantity(&product, quantity)?,
            state.catalog.clone(),
        ),
        CartAction::Clear => (state.cart.cleared(), state.catalog.clone()),
        CartAction::CatalogLoaded(catalog) => (state.cart.clone(), catalog),
    };

    let next = CartState::with_catalog::<S>(cart, catalog, now)?;

    let span = Span::current();

    span.record("line_count", next.cart.len());
    span.record("final_total", next.totals.final_total().to_minor_units());

    Ok(next)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{
        bundles::{BundleDefinition, BundleRequirement, ValidityWindow},
        discounts::BundleDiscount,
        solvers::greedy::GreedySolver,
    };

    use super::*;

    fn now() -> Result<Timestamp, jiff::Error> {
        "2026-06-01T12:00:00Z".parse()
    }

    fn catalog() -> Result<Catalog<'static>, Box<dyn std::error::Error>> {
        Ok(Catalog::new([BundleDefinition::new(
            "b1",
            "Twenty off pairs",
            BundleDiscount::Percentage(Percentage::from(0.2)),
            ValidityWindow::starting("2026-01-01T00:00:00Z".parse()?),
        )
        .with_min_quantity(2)
        .with_requirement(BundleRequirement::required("prod1", 2))])?)
    }

    fn item(quantity: u32) -> CartLineItem<'static> {
        CartLineItem::new("prod1", "Product 1", Money::from_minor(100, GBP), quantity)
    }

    #[test]
    fn catalog_loaded_reprices_existing_cart() -> TestResult {
        let state = CartState::new(GBP);
        let state = reduce::<GreedySolver>(&state, CartAction::AddItem(item(2)), now()?)?;

        assert_eq!(state.totals().final_total(), Money::from_minor(200, GBP));

        let state = reduce::<GreedySolver>(&state, CartAction::CatalogLoaded(catalog()?), now()?)?;

        assert_eq!(state.totals().bundle_discount(), Money::from_minor(40, GBP));
        assert_eq!(state.totals().final_total(), Money::from_minor(160, GBP));

        Ok(())
    }

    #[test]
    fn add_item_merges_quantities() -> TestResult {
        let state = CartState::with_catalog::<GreedySolver>(Cart::new(GBP), catalog()?, now()?)?;

        let state = reduce::<GreedySolver>(&state, CartAction::AddItem(item(1)), now()?)?;

        assert!(state.totals().applied_discounts().is_empty());

        let state = reduce::<GreedySolver>(&state, CartAction::AddItem(item(1)), now()?)?;

        assert_eq!(state.cart().quantity_of(&ProductId::from("prod1")), 2);
        assert_eq!(state.totals().applied_discounts().len(), 1);

        Ok(())
    }

    #[test]
    fn update_quantity_to_zero_removes_line() -> TestResult {
        let state = CartState::with_catalog::<GreedySolver>(Cart::new(GBP), catalog()?, now()?)?;
        let state = reduce::<GreedySolver>(&state, CartAction::AddItem(item(3)), now()?)?;

        let state = reduce::<GreedySolver>(
            &state,
            CartAction::UpdateQuantity(ProductId::from("prod1"), 0),
            now()?,
        )?;

        assert!(state.cart().is_empty());
        assert_eq!(state.totals(), &CartTotals::empty(GBP));

        Ok(())
    }

    #[test]
    fn remove_and_clear_recompute_totals() -> TestResult {
        let state = CartState::with_catalog::<GreedySolver>(Cart::new(GBP), catalog()?, now()?)?;
        let state = reduce::<GreedySolver>(&state, CartAction::AddItem(item(2)), now()?)?;

        let removed = reduce::<GreedySolver>(
            &state,
            CartAction::RemoveItem(ProductId::from("prod1")),
            now()?,
        )?;
        let cleared = reduce::<GreedySolver>(&state, CartAction::Clear, now()?)?;

        assert_eq!(removed.totals(), &CartTotals::empty(GBP));
        assert_eq!(cleared.totals(), &CartTotals::empty(GBP));
        assert!(!cleared.catalog().is_empty());

        Ok(())
    }

    #[test]
    fn failed_action_leaves_state_untouched() -> TestResult {
        let state = CartState::with_catalog::<GreedySolver>(Cart::new(GBP), catalog()?, now()?)?;
        let state = reduce::<GreedySolver>(&state, CartAction::AddItem(item(2)), now()?)?;

        let result = reduce::<GreedySolver>(
            &state,
            CartAction::RemoveItem(ProductId::from("missing")),
            now()?,
        );

        assert!(matches!(
            result,
            Err(StateError::Cart(CartError::ProductNotFound(_)))
        ));
        assert_eq!(state.totals().final_total(), Money::from_minor(160, GBP));

        Ok(())
    }

    #[test]
    fn action_names_are_stable() {
        assert_eq!(CartAction::Clear.name(), "clear");
        assert_eq!(CartAction::AddItem(item(1)).name(), "add_item");
    }
}
