//! Greedy Solver

use std::cmp::Reverse;

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    bundles::calculator::PricedBundle,
    products::ProductId,
    solvers::{Selection, Solver, SolverError},
};

/// Picks bundles largest discount first, skipping any that overlap a bundle
/// already picked.
///
/// Ties keep their input order, so the result is fully determined by the
/// order of the candidates.
#[derive(Debug)]
pub struct GreedySolver;

impl Solver for GreedySolver {
    fn select<'a>(
        candidates: &[PricedBundle<'a>],
        subtotal: Money<'a, Currency>,
    ) -> Result<Selection<'a>, SolverError> {
        let mut ranked: SmallVec<[&PricedBundle<'a>; 8]> = candidates
            .iter()
            // A bundle that saves nothing is never applied
            .filter(|candidate| candidate.discount().to_minor_units() > 0)
            .collect();

        // Stable, so equal discounts stay in catalog order
        ranked.sort_by_key(|candidate| Reverse(candidate.discount().to_minor_units()));

        let mut claimed: FxHashSet<ProductId> = FxHashSet::default();
        let mut accepted: SmallVec<[PricedBundle<'a>; 4]> = SmallVec::new();

        for candidate in ranked {
            let footprint = candidate.eligible().footprint();

            if footprint.intersects(&claimed) {
                debug!(
                    bundle_id = candidate.eligible().bundle().id(),
                    discount = candidate.discount().to_minor_units(),
                    "bundle overlaps a better bundle, skipping"
                );

                continue;
            }

            claimed.extend(footprint.iter().cloned());
            accepted.push(candidate.clone());
        }

        Selection::from_accepted(accepted, subtotal)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::solvers::tests::{candidates, ids};

    use super::*;

    #[test]
    fn better_bundle_wins_a_conflict() -> TestResult {
        let (candidates, subtotal) = candidates(&[
            ("a", 40, "prod1"),
            ("b", 45, "prod1,prod2"),
        ])?;

        let selection = GreedySolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["b"]);
        assert_eq!(selection.total_discount().to_minor_units(), 45);

        Ok(())
    }

    #[test]
    fn disjoint_bundles_are_all_applied() -> TestResult {
        let (candidates, subtotal) = candidates(&[
            ("a", 10, "prod1"),
            ("b", 30, "prod2"),
            ("c", 20, "prod3"),
        ])?;

        let selection = GreedySolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["b", "c", "a"]);
        assert_eq!(selection.total_discount().to_minor_units(), 60);

        Ok(())
    }

    #[test]
    fn ties_keep_input_order() -> TestResult {
        let (candidates, subtotal) =
            candidates(&[("first", 20, "prod1"), ("second", 20, "prod1")])?;

        let selection = GreedySolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["first"]);

        Ok(())
    }

    #[test]
    fn greedy_is_not_always_optimal() -> TestResult {
        let (candidates, subtotal) = candidates(&[
            ("wide", 50, "prod1,prod2"),
            ("left", 30, "prod1"),
            ("right", 30, "prod2"),
        ])?;

        let selection = GreedySolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["wide"]);

        Ok(())
    }

    #[test]
    fn zero_discounts_are_skipped() -> TestResult {
        let (candidates, subtotal) = candidates(&[("nothing", 0, "prod1")])?;

        let selection = GreedySolver::select(&candidates, subtotal)?;

        assert!(selection.is_empty());

        Ok(())
    }

    #[test]
    fn no_candidates_is_empty_selection() -> TestResult {
        let (_, subtotal) = candidates(&[])?;

        let selection = GreedySolver::select(&[], subtotal)?;

        assert!(selection.is_empty());
        assert_eq!(selection.final_total(), selection.subtotal());

        Ok(())
    }
}
