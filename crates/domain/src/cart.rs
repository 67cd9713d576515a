//! The mutable pre-order cart aggregate.
//!
//! Carts merge at line granularity keyed by `(product_id, variant)`:
//! adding an existing line increments its quantity, adding a new line
//! appends it. Order of insertion is preserved.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::{CustomerId, Money, ProductId, ShippingAddress};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The line to update or remove does not exist.
    #[error("item not found in cart: {product_id}")]
    ItemNotFound { product_id: String },
}

/// A line in a cart.
///
/// `unit_price` is captured from the catalog at mutation time and refreshed
/// on every change to the line, so checkout sees a consistent snapshot even
/// if catalog prices drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Product variant (e.g. ring size), if any.
    #[serde(default)]
    pub variant: Option<String>,

    /// Quantity in the cart.
    pub quantity: u32,

    /// Unit price captured at the latest mutation.
    pub unit_price: Money,
}

impl CartItem {
    /// Creates a new cart item.
    pub fn new(
        product_id: impl Into<ProductId>,
        variant: Option<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            variant,
            quantity,
            unit_price,
        }
    }

    /// Returns the line subtotal (`unit_price * quantity`).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    fn matches(&self, product_id: &ProductId, variant: Option<&str>) -> bool {
        self.product_id == *product_id && self.variant.as_deref() == variant
    }
}

/// The active cart of a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    customer_id: CustomerId,
    items: Vec<CartItem>,
    shipping_address: Option<ShippingAddress>,
}

impl Cart {
    /// Creates a new empty cart for a customer.
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            items: Vec::new(),
            shipping_address: None,
        }
    }

    /// Returns the customer owning this cart.
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the attached shipping address, if any.
    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of line subtotals.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Adds an item to the cart.
    ///
    /// An existing `(product_id, variant)` line has its quantity
    /// incremented and its unit price refreshed rather than a row
    /// duplicated.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.matches(&item.product_id, item.variant.as_deref()))
        {
            existing.quantity += item.quantity;
            existing.unit_price = item.unit_price;
        } else {
            self.items.push(item);
        }

        Ok(())
    }

    /// Sets the quantity of an existing line, refreshing its unit price.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let line = self
            .items
            .iter_mut()
            .find(|line| line.matches(product_id, variant))
            .ok_or_else(|| CartError::ItemNotFound {
                product_id: product_id.to_string(),
            })?;

        line.quantity = quantity;
        line.unit_price = unit_price;
        Ok(())
    }

    /// Removes a line from the cart.
    pub fn remove_item(
        &mut self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(product_id, variant));

        if self.items.len() == before {
            return Err(CartError::ItemNotFound {
                product_id: product_id.to_string(),
            });
        }
        Ok(())
    }

    /// Replaces all lines, keeping the attached address.
    pub fn replace_items(&mut self, items: Vec<CartItem>) {
        self.items = items;
    }

    /// Attaches a shipping address for the upcoming checkout.
    pub fn attach_address(&mut self, address: ShippingAddress) {
        self.shipping_address = Some(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(CustomerId::new())
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = cart();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().cents(), 0);
    }

    #[test]
    fn test_add_item() {
        let mut cart = cart();
        cart.add_item(CartItem::new("JOY-001", None, 2, Money::from_cents(1999)))
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.subtotal().cents(), 3998);
    }

    #[test]
    fn test_add_same_line_increments_quantity() {
        let mut cart = cart();
        cart.add_item(CartItem::new("JOY-001", None, 2, Money::from_cents(1999)))
            .unwrap();
        cart.add_item(CartItem::new("JOY-001", None, 3, Money::from_cents(2099)))
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        let line = &cart.items()[0];
        assert_eq!(line.quantity, 5);
        // Price was refreshed at the latest mutation.
        assert_eq!(line.unit_price.cents(), 2099);
    }

    #[test]
    fn test_same_product_different_variant_is_a_new_line() {
        let mut cart = cart();
        cart.add_item(CartItem::new(
            "JOY-001",
            Some("6".to_string()),
            1,
            Money::from_cents(1999),
        ))
        .unwrap();
        cart.add_item(CartItem::new(
            "JOY-001",
            Some("8".to_string()),
            1,
            Money::from_cents(1999),
        ))
        .unwrap();

        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_add_zero_quantity_fails() {
        let mut cart = cart();
        let result = cart.add_item(CartItem::new("JOY-001", None, 0, Money::from_cents(1999)));
        assert!(matches!(result, Err(CartError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = cart();
        cart.add_item(CartItem::new("JOY-001", None, 2, Money::from_cents(1999)))
            .unwrap();

        cart.update_quantity(&ProductId::new("JOY-001"), None, 5, Money::from_cents(1899))
            .unwrap();

        let line = &cart.items()[0];
        assert_eq!(line.quantity, 5);
        assert_eq!(line.unit_price.cents(), 1899);
    }

    #[test]
    fn test_update_missing_line_fails() {
        let mut cart = cart();
        let result = cart.update_quantity(
            &ProductId::new("JOY-999"),
            None,
            1,
            Money::from_cents(1000),
        );
        assert!(matches!(result, Err(CartError::ItemNotFound { .. })));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = cart();
        cart.add_item(CartItem::new("JOY-001", None, 2, Money::from_cents(1999)))
            .unwrap();
        cart.remove_item(&ProductId::new("JOY-001"), None).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_line_fails() {
        let mut cart = cart();
        let result = cart.remove_item(&ProductId::new("JOY-999"), None);
        assert!(matches!(result, Err(CartError::ItemNotFound { .. })));
    }

    #[test]
    fn test_remove_matches_variant() {
        let mut cart = cart();
        cart.add_item(CartItem::new(
            "JOY-001",
            Some("6".to_string()),
            1,
            Money::from_cents(1999),
        ))
        .unwrap();
        cart.add_item(CartItem::new(
            "JOY-001",
            Some("8".to_string()),
            1,
            Money::from_cents(1999),
        ))
        .unwrap();

        cart.remove_item(&ProductId::new("JOY-001"), Some("6"))
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].variant.as_deref(), Some("8"));
    }

    #[test]
    fn test_replace_items_keeps_address() {
        let mut cart = cart();
        cart.attach_address(ShippingAddress {
            recipient: "Ana Torres".to_string(),
            line1: "Calle 10 # 5-21".to_string(),
            line2: None,
            city: "Bogotá".to_string(),
            region: "Cundinamarca".to_string(),
            postal_code: "110111".to_string(),
            country: "CO".to_string(),
            phone: None,
        });

        cart.replace_items(vec![CartItem::new(
            "JOY-002",
            None,
            1,
            Money::from_cents(4999),
        )]);

        assert_eq!(cart.line_count(), 1);
        assert!(cart.shipping_address().is_some());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut cart = cart();
        cart.add_item(CartItem::new("JOY-001", None, 2, Money::from_cents(1999)))
            .unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let deserialized: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.customer_id(), cart.customer_id());
        assert_eq!(deserialized.line_count(), 1);
    }
}
