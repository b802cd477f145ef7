//! Engine
//!
//! Runs a cart through the whole pipeline: eligibility, pricing, selection
//! and totals.

use jiff::Timestamp;
use thiserror::Error;
use tracing::{Span, warn};

use crate::{
    bundles::{
        Catalog,
        calculator::{PricedBundle, price_bundle},
        eligibility::{EligibleBundle, filter_eligible},
    },
    cart::Cart,
    pricing::TotalPriceError,
    solvers::{Selection, Solver, SolverError},
    totals::{CartTotals, TotalsError, aggregate},
};

/// Errors raised while computing cart totals.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cart subtotal could not be calculated.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// Wrapped solver error
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// Wrapped totals error
    #[error(transparent)]
    Totals(#[from] TotalsError),
}

/// Price every eligible bundle, dropping any whose discount cannot be calculated.
pub fn price_eligible<'a>(
    eligible: impl IntoIterator<Item = EligibleBundle<'a>>,
) -> Vec<PricedBundle<'a>> {
    eligible
        .into_iter()
        .filter_map(|eligible| {
            let bundle_id = eligible.bundle().id().to_string();

            match price_bundle(eligible) {
                Ok(priced) => Some(priced),
                Err(error) => {
                    warn!(%bundle_id, %error, "could not price bundle, treating as ineligible");
                    None
                }
            }
        })
        .collect()
}

/// Choose the bundles to apply to a cart at `now`.
///
/// # Errors
///
/// Returns an [`EngineError`] if the subtotal cannot be calculated or the
/// solver fails.
#[tracing::instrument(
    name = "bundles.engine.compute_selection",
    skip_all,
    fields(
        line_count = cart.len(),
        bundle_count = catalog.len(),
        candidate_count = tracing::field::Empty,
        selected_count = tracing::field::Empty
    ),
    err
)]
pub fn compute_selection<'a, S: Solver>(
    cart: &Cart<'a>,
    catalog: &Catalog<'a>,
    now: Timestamp,
) -> Result<Selection<'a>, EngineError> {
    let subtotal = cart.subtotal()?;
    let candidates = price_eligible(filter_eligible(cart, catalog, now));

    let span = Span::current();

    span.record("candidate_count", candidates.len());

    let selection = S::select(&candidates, subtotal)?;

    span.record("selected_count", selection.applied().len());

    Ok(selection)
}

/// Compute the totals for a cart at `now`.
///
/// # Errors
///
/// Returns an [`EngineError`] if any stage of the pipeline fails.
#[tracing::instrument(
    name = "bundles.engine.compute_totals",
    skip_all,
    fields(
        currency = cart.currency().iso_alpha_code,
        item_count = cart.item_count(),
        bundle_discount = tracing::field::Empty,
        final_total = tracing::field::Empty
    ),
    err
)]
pub fn compute_totals<'a, S: Solver>(
    cart: &Cart<'a>,
    catalog: &Catalog<'a>,
    now: Timestamp,
) -> Result<CartTotals<'a>, EngineError> {
    let selection = compute_selection::<S>(cart, catalog, now)?;
    let totals = aggregate(cart, &selection)?;

    let span = Span::current();

    span.record("bundle_discount", totals.bundle_discount().to_minor_units());
    span.record("final_total", totals.final_total().to_minor_units());

    Ok(totals)
}
