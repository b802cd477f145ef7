//! Footprints
//!
//! The set of products a priced bundle consumes. Two bundles may only be
//! applied together when their footprints are disjoint.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::products::ProductId;

/// Ordered, de-duplicated set of products consumed by a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    products: SmallVec<[ProductId; 4]>,
}

impl Footprint {
    /// Create an empty footprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product, ignoring duplicates.
    pub fn insert(&mut self, product: ProductId) {
        if !self.products.contains(&product) {
            self.products.push(product);
        }
    }

    /// Whether the footprint includes the product.
    pub fn contains(&self, product: &ProductId) -> bool {
        self.products.contains(product)
    }

    /// Whether any product in this footprint is already claimed.
    pub fn intersects(&self, claimed: &FxHashSet<ProductId>) -> bool {
        self.products.iter().any(|product| claimed.contains(product))
    }

    /// Whether two footprints share no products.
    pub fn is_disjoint(&self, other: &Footprint) -> bool {
        !self.products.iter().any(|product| other.contains(product))
    }

    /// Iterate over the products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.products.iter()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the footprint is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<ProductId> for Footprint {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        let mut footprint = Footprint::new();

        for product in iter {
            footprint.insert(product);
        }

        footprint
    }
}
