//! Lattice Bundles
//!
//! A promotional bundle discount engine. Given a cart and a catalog of bundle
//! offers it works out which bundles the cart qualifies for, prices each one,
//! and picks a set of bundles that never share a product.

pub mod bundles;
pub mod cart;
pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod solvers;
pub mod state;
pub mod totals;
pub mod utils;
