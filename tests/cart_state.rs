//! Integration test driving a cart through a sequence of state transitions,
//! with the catalog arriving after the shopper has started filling the cart.

use std::error::Error;

use jiff::Timestamp;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use lattice_bundles::{fixtures::Fixture, prelude::*};

fn lunch() -> Result<(Fixture<'static>, Timestamp), Box<dyn Error>> {
    let fixture = Fixture::from_set("lunch")?;
    let now = fixture.now().ok_or("fixture does not name an instant")?;

    Ok((fixture, now))
}

fn line(product: &str, name: &str, minor: i64, quantity: u32) -> CartLineItem<'static> {
    CartLineItem::new(product, name, Money::from_minor(minor, GBP), quantity)
}

#[test]
fn shopper_builds_a_meal_deal() -> TestResult {
    let (fixture, now) = lunch()?;

    let state = CartState::new(GBP);
    let state = reduce::<GreedySolver>(
        &state,
        CartAction::AddItem(line("sandwich", "Chicken Sandwich", 350, 1)),
        now,
    )?;
    let state = reduce::<GreedySolver>(
        &state,
        CartAction::AddItem(line("crisps", "Sea Salt Crisps", 100, 1)),
        now,
    )?;

    // Nothing can apply until the catalog arrives
    assert!(state.totals().applied_discounts().is_empty());
    assert_eq!(state.totals().final_total(), Money::from_minor(450, GBP));

    let state = reduce::<GreedySolver>(&state, CartAction::CatalogLoaded(fixture.catalog()?), now)?;

    // Two of three meal deal products is not enough
    assert!(state.totals().applied_discounts().is_empty());

    let state = reduce::<GreedySolver>(
        &state,
        CartAction::AddItem(line("drink", "Sparkling Water", 125, 1)),
        now,
    )?;

    assert_eq!(state.totals().bundle_discount(), Money::from_minor(150, GBP));
    assert_eq!(state.totals().final_total(), Money::from_minor(425, GBP));

    Ok(())
}

#[test]
fn adding_a_second_sandwich_switches_bundle() -> TestResult {
    let (fixture, now) = lunch()?;

    let state = CartState::with_catalog::<ILPSolver>(Cart::new(GBP), fixture.catalog()?, now)?;
    let state = reduce::<ILPSolver>(
        &state,
        CartAction::AddItem(line("sandwich", "Chicken Sandwich", 350, 1)),
        now,
    )?;
    let state = reduce::<ILPSolver>(
        &state,
        CartAction::AddItem(line("drink", "Sparkling Water", 125, 1)),
        now,
    )?;

    // The meal deal needs three units across its products
    assert!(state.totals().applied_discounts().is_empty());

    let state = reduce::<ILPSolver>(
        &state,
        CartAction::UpdateQuantity(ProductId::from("sandwich"), 2),
        now,
    )?;

    let ids: Vec<&str> = state
        .totals()
        .applied_discounts()
        .iter()
        .map(|bundle| bundle.eligible().bundle().id())
        .collect();

    // Meal deal on sandwich and drink still has no crisps, so the pair wins
    assert_eq!(ids, vec!["sandwich-pair"]);
    assert_eq!(state.totals().bundle_discount(), Money::from_minor(140, GBP));

    Ok(())
}

#[test]
fn removing_lines_drops_their_bundles() -> TestResult {
    let (fixture, now) = lunch()?;

    let state =
        CartState::with_catalog::<GreedySolver>(fixture.cart()?, fixture.catalog()?, now)?;

    assert_eq!(state.totals().bundle_discount(), Money::from_minor(230, GBP));

    let state = reduce::<GreedySolver>(
        &state,
        CartAction::RemoveItem(ProductId::from("crisps")),
        now,
    )?;

    // Without crisps the sandwiches take 20% off and the cookies stay 3 for 2
    assert_eq!(state.totals().bundle_discount(), Money::from_minor(220, GBP));

    let state = reduce::<GreedySolver>(&state, CartAction::Clear, now)?;

    assert!(state.cart().is_empty());
    assert_eq!(state.totals(), &CartTotals::empty(GBP));
    assert_eq!(state.catalog().len(), 7);

    Ok(())
}

#[test]
fn rejected_action_keeps_previous_state() -> TestResult {
    let (fixture, now) = lunch()?;

    let state =
        CartState::with_catalog::<GreedySolver>(fixture.cart()?, fixture.catalog()?, now)?;
    let before = state.totals().clone();

    let result = reduce::<GreedySolver>(
        &state,
        CartAction::AddItem(CartLineItem::new(
            "muffin",
            "Blueberry Muffin",
            Money::from_minor(200, rusty_money::iso::USD),
            1,
        )),
        now,
    );

    assert!(matches!(
        result,
        Err(StateError::Cart(CartError::CurrencyMismatch(..)))
    ));
    assert_eq!(state.totals(), &before);

    Ok(())
}
