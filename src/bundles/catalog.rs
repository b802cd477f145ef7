//! Bundle Catalog

use std::sync::Arc;

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;
use tracing::warn;

use crate::bundles::{BundleDefinition, BundleDefinitionError, BundleKey, records::BundleRecord};

/// Errors raised when building a catalog from trusted definitions.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two definitions share an id.
    #[error("Duplicate bundle id: {0}")]
    DuplicateBundle(String),

    /// A definition failed validation.
    #[error("Bundle {id} is malformed: {source}")]
    Definition {
        /// Offending bundle id
        id: String,

        /// Validation failure
        source: BundleDefinitionError,
    },
}

/// An immutable, ordered collection of bundle definitions.
///
/// Definitions are shared behind an [`Arc`], so eligible and priced bundles can
/// keep hold of their definition without borrowing the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog<'a> {
    bundles: SlotMap<BundleKey, Arc<BundleDefinition<'a>>>,
    order: Vec<BundleKey>,
    ids: FxHashMap<String, BundleKey>,
}

impl<'a> Catalog<'a> {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from definitions, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a definition is malformed or an id repeats.
    pub fn new(
        definitions: impl IntoIterator<Item = BundleDefinition<'a>>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::empty();

        for definition in definitions {
            definition
                .validate()
                .map_err(|source| CatalogError::Definition {
                    id: definition.id().to_string(),
                    source,
                })?;

            catalog.insert(definition)?;
        }

        Ok(catalog)
    }

    /// Build a catalog from raw records, dropping any that are malformed.
    ///
    /// Dropped records are logged and otherwise treated as ineligible bundles.
    pub fn from_records(
        records: impl IntoIterator<Item = BundleRecord>,
        currency: &'a Currency,
    ) -> Self {
        let mut catalog = Self::empty();

        for (idx, record) in records.into_iter().enumerate() {
            let id = record.id.clone().unwrap_or_default();

            let result = record
                .into_definition(currency)
                .map_err(|source| CatalogError::Definition {
                    id: id.clone(),
                    source,
                })
                .and_then(|definition| catalog.insert(definition));

            if let Err(err) = result {
                warn!(
                    record = idx,
                    bundle_id = %id,
                    error = %err,
                    "dropping malformed bundle record"
                );
            }
        }

        catalog
    }

    fn insert(&mut self, definition: BundleDefinition<'a>) -> Result<BundleKey, CatalogError> {
        if self.ids.contains_key(definition.id()) {
            return Err(CatalogError::DuplicateBundle(definition.id().to_string()));
        }

        let id = definition.id().to_string();
        let key = self.bundles.insert(Arc::new(definition));

        self.order.push(key);
        self.ids.insert(id, key);

        Ok(key)
    }

    /// Get a definition by key.
    pub fn get(&self, key: BundleKey) -> Option<&Arc<BundleDefinition<'a>>> {
        self.bundles.get(key)
    }

    /// Look up a definition by its bundle id.
    pub fn by_id(&self, id: &str) -> Option<(BundleKey, &Arc<BundleDefinition<'a>>)> {
        let key = *self.ids.get(id)?;

        self.bundles.get(key).map(|definition| (key, definition))
    }

    /// Iterate over definitions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (BundleKey, &Arc<BundleDefinition<'a>>)> {
        self.order
            .iter()
            .filter_map(|key| self.bundles.get(*key).map(|definition| (*key, definition)))
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
