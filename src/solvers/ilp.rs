//! ILP Solver

use std::cmp::Reverse;

use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable, variable};
use num_traits::ToPrimitive;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::debug;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::{
    bundles::calculator::PricedBundle,
    products::ProductId,
    solvers::{Selection, Solver, SolverError},
};

/// Binary threshold for determining truthiness
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Solver using Integer Linear Programming (ILP)
///
/// Finds the combination of non-overlapping bundles with the largest total
/// discount. Accepted bundles are reported largest discount first, like the
/// greedy solver.
#[derive(Debug)]
pub struct ILPSolver;

impl Solver for ILPSolver {
    fn select<'a>(
        candidates: &[PricedBundle<'a>],
        subtotal: Money<'a, Currency>,
    ) -> Result<Selection<'a>, SolverError> {
        let candidates: SmallVec<[&PricedBundle<'a>; 8]> = candidates
            .iter()
            // A bundle that saves nothing is never applied
            .filter(|candidate| candidate.discount().to_minor_units() > 0)
            .collect();

        // Return early if there is nothing to choose between
        if candidates.is_empty() {
            return Ok(Selection::empty(subtotal));
        }

        // One binary variable per candidate: 1 if the bundle is applied.
        //
        // The objective is the total discount, and each product may be
        // consumed by at most one applied bundle.
        let mut pb = ProblemVariables::new();
        let mut savings = Expression::default();
        let mut usage: FxHashMap<&ProductId, Expression> = FxHashMap::default();
        let mut vars: SmallVec<[Variable; 8]> = SmallVec::with_capacity(candidates.len());

        for candidate in &candidates {
            let minor_units = candidate.discount().to_minor_units();

            let coeff = i64_to_f64_exact(minor_units)
                .ok_or(SolverError::MinorUnitsNotRepresentable { minor_units })?;

            let var = pb.add(variable().binary());

            savings += var * coeff;

            for product in candidate.eligible().footprint().iter() {
                *usage.entry(product).or_default() += var;
            }

            vars.push(var);
        }

        let mut model = pb.maximise(savings).using(default_solver);

        for (_product, expr) in usage {
            model = model.with(expr.leq(1));
        }

        let solution = model.solve()?;

        let mut accepted: SmallVec<[(usize, &PricedBundle<'a>); 4]> = SmallVec::new();

        for (idx, (candidate, var)) in candidates.iter().zip(&vars).enumerate() {
            if solution.value(*var) > BINARY_THRESHOLD {
                accepted.push((idx, *candidate));
            } else {
                debug!(
                    bundle_id = candidate.eligible().bundle().id(),
                    discount = candidate.discount().to_minor_units(),
                    "bundle left out of optimal selection"
                );
            }
        }

        ensure_disjoint(&accepted)?;

        accepted.sort_by_key(|(idx, candidate)| {
            (Reverse(candidate.discount().to_minor_units()), *idx)
        });

        Selection::from_accepted(
            accepted.into_iter().map(|(_, candidate)| candidate.clone()),
            subtotal,
        )
    }
}

/// Ensure the solver did not apply two bundles to the same product.
///
/// # Errors
///
/// Returns [`SolverError::InvariantViolation`] if two accepted bundles overlap.
fn ensure_disjoint(accepted: &[(usize, &PricedBundle<'_>)]) -> Result<(), SolverError> {
    for (pos, (_, left)) in accepted.iter().enumerate() {
        let overlaps = accepted
            .iter()
            .skip(pos + 1)
            .any(|(_, right)| {
                !left
                    .eligible()
                    .footprint()
                    .is_disjoint(right.eligible().footprint())
            });

        if overlaps {
            return Err(SolverError::InvariantViolation {
                message: "accepted bundles share a product",
            });
        }
    }

    Ok(())
}

/// Convert an `i64` to an `f64` if it can be represented exactly.
fn i64_to_f64_exact(v: i64) -> Option<f64> {
    let f = v.to_f64()?;

    (f.to_i64() == Some(v)).then_some(f)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::solvers::{
        greedy::GreedySolver,
        tests::{candidates, ids},
    };

    use super::*;

    #[test]
    #[expect(
        clippy::cast_precision_loss,
        reason = "This is a test case for exact conversion"
    )]
    fn i64_to_f64_exact_accepts_exactly_representable_integers() {
        let cases: [i64; 5] = [0, 1, -1, 123, 9_007_199_254_740_992]; // 2^53

        for v in cases {
            assert_eq!(i64_to_f64_exact(v), Some(v as f64));
        }
    }

    #[test]
    fn i64_to_f64_exact_rejects_nonrepresentable_integers() {
        let cases: [i64; 2] = [9_007_199_254_740_993, -9_007_199_254_740_993]; // 2^53 + 1

        for v in cases {
            assert_eq!(i64_to_f64_exact(v), None);
        }
    }

    #[test]
    fn two_small_bundles_beat_one_wide_bundle() -> TestResult {
        let (candidates, subtotal) = candidates(&[
            ("wide", 50, "prod1,prod2"),
            ("left", 30, "prod1"),
            ("right", 30, "prod2"),
        ])?;

        let selection = ILPSolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["left", "right"]);
        assert_eq!(selection.total_discount().to_minor_units(), 60);

        Ok(())
    }

    #[test]
    fn never_worse_than_greedy() -> TestResult {
        let (candidates, subtotal) = candidates(&[
            ("a", 40, "prod1"),
            ("b", 45, "prod1,prod2"),
            ("c", 25, "prod2,prod3"),
            ("d", 10, "prod4"),
        ])?;

        let optimal = ILPSolver::select(&candidates, subtotal)?;
        let greedy = GreedySolver::select(&candidates, subtotal)?;

        assert!(
            optimal.total_discount().to_minor_units() >= greedy.total_discount().to_minor_units()
        );
        assert_eq!(ids(&optimal), vec!["a", "c", "d"]);

        Ok(())
    }

    #[test]
    fn disjoint_bundles_are_all_applied() -> TestResult {
        let (candidates, subtotal) = candidates(&[("a", 10, "prod1"), ("b", 30, "prod2")])?;

        let selection = ILPSolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["b", "a"]);
        assert_eq!(selection.final_total().to_minor_units(), 1960);

        Ok(())
    }

    #[test]
    fn no_candidates_is_empty_selection() -> TestResult {
        let (_, subtotal) = candidates(&[("unused", 0, "prod1")])?;

        let selection = ILPSolver::select(&[], subtotal)?;

        assert!(selection.is_empty());

        Ok(())
    }

    #[test]
    fn zero_discounts_are_never_applied() -> TestResult {
        let (candidates, subtotal) =
            candidates(&[("nothing", 0, "prod1"), ("something", 20, "prod2")])?;

        let selection = ILPSolver::select(&candidates, subtotal)?;

        assert_eq!(ids(&selection), vec!["something"]);

        Ok(())
    }
}
