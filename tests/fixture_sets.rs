//! Integration tests for the bundled fixture sets.
//!
//! Each set pairs a cart with a catalog and is priced at the instant the cart
//! fixture names. The `lunch` set exercises every discount kind together with
//! expired, inactive, future and malformed bundles:
//!
//! - Meal Deal (sandwich, crisps, drink): £11.50, £1.50 off
//! - Two Sandwiches, 20% Off: £7.00, £1.40 off (overlaps the meal deal)
//! - Cookies 3 for 2: £2.40, £0.80 off
//! - Coffee and a Cookie, 10% off two units: £3.20, £0.32 off (overlaps the cookies)
//!
//! Both solvers settle on the meal deal and the cookies: £16.30 - £2.30 = £14.00.

use std::error::Error;

use jiff::Timestamp;
use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use lattice_bundles::{
    engine::compute_totals,
    fixtures::Fixture,
    solvers::{Solver, greedy::GreedySolver, ilp::ILPSolver},
    totals::CartTotals,
};

fn totals_for<S: Solver>(set: &str) -> Result<CartTotals<'static>, Box<dyn Error>> {
    let fixture = Fixture::from_set(set)?;
    let now = fixture.now().ok_or("fixture does not name an instant")?;

    Ok(compute_totals::<S>(&fixture.cart()?, &fixture.catalog()?, now)?)
}

fn applied_ids<'a>(totals: &'a CartTotals<'_>) -> Vec<&'a str> {
    totals
        .applied_discounts()
        .iter()
        .map(|bundle| bundle.eligible().bundle().id())
        .collect()
}

#[test]
fn lunch_catalog_keeps_only_well_formed_bundles() -> TestResult {
    let fixture = Fixture::from_set("lunch")?;
    let catalog = fixture.catalog()?;

    // broken-types cannot be read at all
    assert_eq!(fixture.records().len(), 10);
    assert_eq!(catalog.len(), 7);

    for id in [
        "broken-no-requirements",
        "broken-negative-quantity",
        "broken-kind",
        "broken-types",
    ] {
        assert!(catalog.by_id(id).is_none(), "{id} should have been dropped");
    }

    Ok(())
}

#[test]
fn lunch_applies_meal_deal_and_cookies() -> TestResult {
    for totals in [
        totals_for::<GreedySolver>("lunch")?,
        totals_for::<ILPSolver>("lunch")?,
    ] {
        assert_eq!(applied_ids(&totals), vec!["meal-deal", "cookies-3-for-2"]);
        assert_eq!(totals.item_count(), 10);
        assert_eq!(totals.subtotal(), Money::from_minor(1630, GBP));
        assert_eq!(totals.bundle_discount(), Money::from_minor(230, GBP));
        assert_eq!(totals.final_total(), Money::from_minor(1400, GBP));
    }

    Ok(())
}

#[test]
fn lunch_ignores_expired_inactive_and_future_bundles() -> TestResult {
    let totals = totals_for::<ILPSolver>("lunch")?;
    let ids = applied_ids(&totals);

    for id in ["summer-special", "paused-crisps", "autumn-coffee"] {
        assert!(!ids.contains(&id), "{id} should not apply");
    }

    Ok(())
}

#[test]
fn lunch_reprices_when_autumn_offer_starts() -> TestResult {
    let fixture = Fixture::from_set("lunch")?;
    let now: Timestamp = "2026-09-01T00:00:00Z".parse()?;

    let totals = compute_totals::<ILPSolver>(&fixture.cart()?, &fixture.catalog()?, now)?;

    // £1 off coffee beats 32p off coffee and a cookie, and leaves the cookies free
    assert_eq!(
        applied_ids(&totals),
        vec!["meal-deal", "autumn-coffee", "cookies-3-for-2"]
    );
    assert_eq!(totals.bundle_discount(), Money::from_minor(330, GBP));

    Ok(())
}

#[test]
fn percentage_set_takes_twenty_percent_off() -> TestResult {
    let totals = totals_for::<GreedySolver>("percentage")?;
    let bundle = totals.applied_discounts().first().ok_or("no bundle applied")?;

    assert_eq!(bundle.original_price(), &Money::from_minor(200, GBP));
    assert_eq!(bundle.discount(), &Money::from_minor(40, GBP));
    assert_eq!(bundle.discounted_price(), &Money::from_minor(160, GBP));
    assert_eq!(totals.final_total(), Money::from_minor(160, GBP));

    Ok(())
}

#[test]
fn fixed_set_takes_thirty_pence_off() -> TestResult {
    let totals = totals_for::<GreedySolver>("fixed")?;

    assert_eq!(totals.bundle_discount(), Money::from_minor(30, GBP));
    assert_eq!(totals.final_total(), Money::from_minor(70, GBP));

    Ok(())
}

#[test]
fn below_minimum_set_applies_nothing() -> TestResult {
    let totals = totals_for::<GreedySolver>("below_minimum")?;

    assert!(totals.applied_discounts().is_empty());
    assert_eq!(totals.final_total(), totals.subtotal());

    Ok(())
}

#[test]
fn conflict_set_prefers_larger_discount() -> TestResult {
    for totals in [
        totals_for::<GreedySolver>("conflict")?,
        totals_for::<ILPSolver>("conflict")?,
    ] {
        assert_eq!(applied_ids(&totals), vec!["bundle-a"]);
        assert_eq!(totals.bundle_discount(), Money::from_minor(40, GBP));
        assert_eq!(totals.final_total(), Money::from_minor(260, GBP));
    }

    Ok(())
}

#[test]
fn best_of_many_set_applies_only_the_best() -> TestResult {
    let totals = totals_for::<GreedySolver>("best_of_many")?;

    assert_eq!(applied_ids(&totals), vec!["twenty-off"]);
    assert_eq!(totals.final_total(), Money::from_minor(80, GBP));

    Ok(())
}

#[test]
fn overlap_set_shows_ilp_beating_greedy() -> TestResult {
    let greedy = totals_for::<GreedySolver>("overlap")?;
    let ilp = totals_for::<ILPSolver>("overlap")?;

    assert_eq!(applied_ids(&greedy), vec!["wide"]);
    assert_eq!(greedy.bundle_discount(), Money::from_minor(500, GBP));

    assert_eq!(applied_ids(&ilp), vec!["left", "right"]);
    assert_eq!(ilp.bundle_discount(), Money::from_minor(600, GBP));

    Ok(())
}

#[test]
fn totals_render_applied_bundles() -> TestResult {
    let totals = totals_for::<GreedySolver>("lunch")?;
    let mut out = Vec::new();

    totals.write_to(&mut out)?;

    let rendered = String::from_utf8(out)?;

    assert!(rendered.contains("Meal Deal"));
    assert!(rendered.contains("Cookies 3 for 2"));
    assert!(!rendered.contains("Summer Special"));

    Ok(())
}
