//! Lattice Bundles prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    bundles::{
        BundleDefinition, BundleDefinitionError, BundleKey, BundleRequirement, Catalog,
        ValidityWindow,
        calculator::{PricedBundle, price_bundle},
        catalog::CatalogError,
        eligibility::{EligibleBundle, Ineligible, MatchedLine, check_eligibility, filter_eligible},
        footprint::Footprint,
        records::{BundleRecord, RequirementRecord},
    },
    cart::{Cart, CartError, CartLineItem},
    discounts::{BundleDiscount, DiscountError, DiscountKind},
    engine::{EngineError, compute_selection, compute_totals},
    pricing::TotalPriceError,
    products::ProductId,
    solvers::{Selection, Solver, SolverError, greedy::GreedySolver, ilp::ILPSolver},
    state::{CartAction, CartState, StateError, reduce},
    totals::{CartTotals, TotalsError, aggregate},
};
