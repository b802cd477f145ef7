//! Cart

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    pricing::{TotalPriceError, item_count, total_price},
    products::ProductId,
};

/// Errors related to cart construction or mutation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// An item's currency differs from the cart currency (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// The same product appears on more than one line.
    #[error("Product {0} appears on more than one cart line")]
    DuplicateProduct(ProductId),

    /// A line was supplied with a quantity of zero.
    #[error("Item {0} has a quantity of zero")]
    ZeroQuantity(usize),

    /// A product was not found in the cart.
    #[error("Product {0} not found in cart")]
    ProductNotFound(ProductId),

    /// Adding to a line would overflow its quantity.
    #[error("Quantity overflowed for product {0}")]
    QuantityOverflow(ProductId),
}

/// A single product line in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem<'a> {
    product: ProductId,
    name: String,
    unit_price: Money<'a, Currency>,
    quantity: u32,
}

impl<'a> CartLineItem<'a> {
    /// Create a new cart line.
    pub fn new(
        product: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            product: product.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Product on this line
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Display name of the product
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of a single unit
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Number of units on this line
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// An immutable cart snapshot.
///
/// Every mutation returns a new cart, so a snapshot handed to the pricing
/// engine can never change underneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart<'a> {
    items: Vec<CartLineItem<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a new cart with the given lines.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if a line has a different currency or zero quantity,
    /// or if a product appears on more than one line.
    pub fn with_items(
        items: impl Into<Vec<CartLineItem<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();
        let mut seen = FxHashSet::default();

        items.iter().enumerate().try_for_each(|(i, item)| {
            ensure_currency(i, item, currency)?;

            if item.quantity == 0 {
                return Err(CartError::ZeroQuantity(i));
            }

            if !seen.insert(&item.product) {
                return Err(CartError::DuplicateProduct(item.product.clone()));
            }

            Ok(())
        })?;

        Ok(Cart { items, currency })
    }

    /// Add a line to the cart, merging quantities when the product is already present.
    ///
    /// Adding a line with zero quantity leaves the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if the line currency differs from the cart or the merged
    /// quantity overflows.
    pub fn add_item(&self, item: CartLineItem<'a>) -> Result<Self, CartError> {
        ensure_currency(self.items.len(), &item, self.currency)?;

        if item.quantity == 0 {
            return Ok(self.clone());
        }

        let mut items = self.items.clone();

        match items.iter_mut().find(|line| line.product == item.product) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| CartError::QuantityOverflow(item.product.clone()))?;
            }
            None => items.push(item),
        }

        Ok(Cart {
            items,
            currency: self.currency,
        })
    }

    /// Remove a product's line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product is not in the cart.
    pub fn remove_item(&self, product: &ProductId) -> Result<Self, CartError> {
        if self.get(product).is_none() {
            return Err(CartError::ProductNotFound(product.clone()));
        }

        Ok(Cart {
            items: self
                .items
                .iter()
                .filter(|line| &line.product != product)
                .cloned()
                .collect(),
            currency: self.currency,
        })
    }

    /// Set the quantity of a product's line. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product is not in the cart.
    pub fn update_quantity(&self, product: &ProductId, quantity: u32) -> Result<Self, CartError> {
        if quantity == 0 {
            return self.remove_item(product);
        }

        let mut items = self.items.clone();

        let line = items
            .iter_mut()
            .find(|line| &line.product == product)
            .ok_or_else(|| CartError::ProductNotFound(product.clone()))?;

        line.quantity = quantity;

        Ok(Cart {
            items,
            currency: self.currency,
        })
    }

    /// Return an empty cart in the same currency.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Cart::new(self.currency)
    }

    /// Calculate the subtotal of the cart.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if there was a money arithmetic, overflow or currency
    /// mismatch error.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        total_price(&self.items, self.currency)
    }

    /// Total number of units in the cart.
    pub fn item_count(&self) -> u64 {
        item_count(&self.items)
    }

    /// Get the line for a product.
    pub fn get(&self, product: &ProductId) -> Option<&CartLineItem<'a>> {
        self.items.iter().find(|line| &line.product == product)
    }

    /// Quantity of a product in the cart (zero when absent).
    pub fn quantity_of(&self, product: &ProductId) -> u32 {
        self.get(product).map_or(0, CartLineItem::quantity)
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLineItem<'a>> {
        self.items.iter()
    }

    /// Get the number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

fn ensure_currency(
    idx: usize,
    item: &CartLineItem<'_>,
    currency: &'static Currency,
) -> Result<(), CartError> {
    let item_currency = item.unit_price.currency();

    if item_currency == currency {
        Ok(())
    } else {
        Err(CartError::CurrencyMismatch(
            idx,
            item_currency.iso_alpha_code,
            currency.iso_alpha_code,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    fn line<'a>(id: &str, minor: i64, quantity: u32) -> CartLineItem<'a> {
        CartLineItem::new(id, format!("Product {id}"), Money::from_minor(minor, GBP), quantity)
    }

    fn test_cart<'a>() -> Result<Cart<'a>, CartError> {
        Cart::with_items([line("a", 100, 2), line("b", 250, 1)], GBP)
    }

    #[test]
    fn new_with_currency() {
        let cart = Cart::new(GBP);

        assert_eq!(cart.currency(), GBP);
        assert!(cart.is_empty());
    }

    #[test]
    fn with_items_currency_mismatch_errors() {
        let items = [
            line("a", 100, 1),
            CartLineItem::new("b", "B", Money::from_minor(100, USD), 1),
        ];

        assert_eq!(
            Cart::with_items(items, GBP),
            Err(CartError::CurrencyMismatch(
                1,
                USD.iso_alpha_code,
                GBP.iso_alpha_code
            ))
        );
    }

    #[test]
    fn with_items_rejects_duplicate_products() {
        let items = [line("a", 100, 1), line("a", 100, 2)];

        assert_eq!(
            Cart::with_items(items, GBP),
            Err(CartError::DuplicateProduct(ProductId::from("a")))
        );
    }

    #[test]
    fn with_items_rejects_zero_quantity() {
        let items = [line("a", 100, 1), line("b", 100, 0)];

        assert_eq!(Cart::with_items(items, GBP), Err(CartError::ZeroQuantity(1)));
    }

    #[test]
    fn subtotal_and_item_count() -> TestResult {
        let cart = test_cart()?;

        assert_eq!(cart.subtotal()?, Money::from_minor(450, GBP));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.len(), 2);

        Ok(())
    }

    #[test]
    fn add_item_merges_existing_line() -> TestResult {
        let cart = test_cart()?.add_item(line("a", 100, 3))?;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(&ProductId::from("a")), 5);

        Ok(())
    }

    #[test]
    fn add_item_appends_new_line_and_leaves_original_untouched() -> TestResult {
        let original = test_cart()?;
        let cart = original.add_item(line("c", 75, 1))?;

        assert_eq!(cart.len(), 3);
        assert_eq!(original.len(), 2);

        Ok(())
    }

    #[test]
    fn add_item_rejects_other_currency() -> TestResult {
        let cart = test_cart()?;
        let result = cart.add_item(CartLineItem::new("c", "C", Money::from_minor(1, USD), 1));

        assert!(matches!(result, Err(CartError::CurrencyMismatch(2, _, _))));

        Ok(())
    }

    #[test]
    fn add_item_reports_quantity_overflow() -> TestResult {
        let cart = test_cart()?.add_item(line("a", 100, u32::MAX));

        assert_eq!(cart, Err(CartError::QuantityOverflow(ProductId::from("a"))));

        Ok(())
    }

    #[test]
    fn update_quantity_to_zero_removes_line() -> TestResult {
        let cart = test_cart()?.update_quantity(&ProductId::from("a"), 0)?;

        assert_eq!(cart.len(), 1);
        assert!(cart.get(&ProductId::from("a")).is_none());

        Ok(())
    }

    #[test]
    fn update_quantity_sets_quantity() -> TestResult {
        let cart = test_cart()?.update_quantity(&ProductId::from("b"), 4)?;

        assert_eq!(cart.quantity_of(&ProductId::from("b")), 4);

        Ok(())
    }

    #[test]
    fn remove_missing_product_errors() -> TestResult {
        let result = test_cart()?.remove_item(&ProductId::from("zzz"));

        assert_eq!(result, Err(CartError::ProductNotFound(ProductId::from("zzz"))));

        Ok(())
    }

    #[test]
    fn cleared_keeps_currency() -> TestResult {
        let cart = test_cart()?.cleared();

        assert!(cart.is_empty());
        assert_eq!(cart.currency(), GBP);

        Ok(())
    }
}
