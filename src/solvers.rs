//! Solvers for Bundle Selection

use good_lp::ResolutionError;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::bundles::calculator::PricedBundle;

pub mod greedy;
pub mod ilp;

/// Solver Errors
#[derive(Debug, Error)]
pub enum SolverError {
    /// Money amount in minor units cannot be represented exactly as a solver coefficient.
    #[error(
        "money amount in minor units cannot be represented exactly as a solver coefficient: {minor_units}"
    )]
    MinorUnitsNotRepresentable {
        /// Money amount in minor units
        minor_units: i64,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Wrapped solver resolution error
    #[error(transparent)]
    ResolutionError(#[from] ResolutionError),

    /// Internal solver invariant was violated (this is a bug).
    #[error("solver invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

/// The bundles chosen for a cart and the totals they produce.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    applied: SmallVec<[PricedBundle<'a>; 4]>,
    subtotal: Money<'a, Currency>,
    total_discount: Money<'a, Currency>,
    final_total: Money<'a, Currency>,
}

impl<'a> Selection<'a> {
    /// A selection with no bundles applied.
    pub fn empty(subtotal: Money<'a, Currency>) -> Self {
        let zero = Money::from_minor(0, subtotal.currency());

        Self {
            applied: SmallVec::new(),
            subtotal,
            total_discount: zero,
            final_total: Money::from_minor(subtotal.to_minor_units().max(0), subtotal.currency()),
        }
    }

    /// Build a selection from accepted bundles, in the order they were accepted.
    ///
    /// The final total never drops below zero.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Money`] if a bundle discount is in a different
    /// currency from the subtotal.
    pub fn from_accepted(
        applied: impl IntoIterator<Item = PricedBundle<'a>>,
        subtotal: Money<'a, Currency>,
    ) -> Result<Self, SolverError> {
        let mut selection = Self::empty(subtotal);

        for bundle in applied {
            selection.total_discount = selection.total_discount.add(*bundle.discount())?;
            selection.applied.push(bundle);
        }

        let remaining = subtotal.sub(selection.total_discount)?;

        selection.final_total = Money::from_minor(remaining.to_minor_units().max(0), subtotal.currency());

        Ok(selection)
    }

    /// Bundles applied, in acceptance order
    pub fn applied(&self) -> &[PricedBundle<'a>] {
        &self.applied
    }

    /// Cart subtotal before bundle discounts
    pub fn subtotal(&self) -> &Money<'a, Currency> {
        &self.subtotal
    }

    /// Sum of the applied bundle discounts
    pub fn total_discount(&self) -> &Money<'a, Currency> {
        &self.total_discount
    }

    /// Subtotal less the total discount, floored at zero
    pub fn final_total(&self) -> &Money<'a, Currency> {
        &self.final_total
    }

    /// Whether no bundles were applied.
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Trait for choosing a non-conflicting set of priced bundles
pub trait Solver {
    /// Choose which candidates to apply to a cart with the given subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the solver encounters an error.
    fn select<'a>(
        candidates: &[PricedBundle<'a>],
        subtotal: Money<'a, Currency>,
    ) -> Result<Selection<'a>, SolverError>;
}
