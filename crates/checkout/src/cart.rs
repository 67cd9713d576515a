//! Cart service: line-item mutations with catalog-captured prices.

use std::sync::Arc;

use domain::{Cart, CartError, CartItem, CustomerId, Money, ProductId, ShippingAddress};
use store::CartStore;

use crate::error::CheckoutError;
use crate::services::catalog::CatalogService;

/// High-level cart operations.
///
/// Every mutation re-reads the current unit price from the catalog and
/// stores it on the line, so checkout sees a consistent snapshot even if
/// catalog prices drift between add and checkout. Stock is NOT checked
/// here; the finalizer re-validates against live stock.
#[derive(Clone)]
pub struct CartService {
    carts: CartStore,
    catalog: Arc<dyn CatalogService>,
}

impl CartService {
    /// Creates a new cart service.
    pub fn new(carts: CartStore, catalog: Arc<dyn CatalogService>) -> Self {
        Self { carts, catalog }
    }

    /// Returns a snapshot of the customer's active cart.
    pub async fn get(&self, customer_id: CustomerId) -> Cart {
        self.carts.read(customer_id).await
    }

    /// Adds an item to the cart, merging into an existing
    /// `(product, variant)` line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        variant: Option<String>,
        quantity: u32,
    ) -> Result<Cart, CheckoutError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity }.into());
        }

        let unit_price = self.price_of(&product_id, variant.as_deref()).await?;

        self.carts
            .mutate(customer_id, move |cart| {
                cart.add_item(CartItem::new(product_id, variant, quantity, unit_price))?;
                Ok(cart.clone())
            })
            .await
    }

    /// Sets the quantity of an existing line. A quantity of zero or less
    /// removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        variant: Option<String>,
        quantity: i64,
    ) -> Result<Cart, CheckoutError> {
        if quantity <= 0 {
            return self.remove_item(customer_id, product_id, variant).await;
        }
        let quantity = quantity as u32;

        let unit_price = self.price_of(&product_id, variant.as_deref()).await?;

        self.carts
            .mutate(customer_id, move |cart| {
                cart.update_quantity(&product_id, variant.as_deref(), quantity, unit_price)?;
                Ok(cart.clone())
            })
            .await
    }

    /// Removes a line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        variant: Option<String>,
    ) -> Result<Cart, CheckoutError> {
        self.carts
            .mutate(customer_id, move |cart| {
                cart.remove_item(&product_id, variant.as_deref())?;
                Ok(cart.clone())
            })
            .await
    }

    /// Replaces the cart's lines wholesale (PUT semantics), re-pricing
    /// every line. Zero-quantity lines are dropped; duplicate lines merge.
    #[tracing::instrument(skip(self, lines))]
    pub async fn replace(
        &self,
        customer_id: CustomerId,
        lines: Vec<(ProductId, Option<String>, u32)>,
    ) -> Result<Cart, CheckoutError> {
        let mut items = Vec::with_capacity(lines.len());
        for (product_id, variant, quantity) in lines {
            if quantity == 0 {
                continue;
            }
            let unit_price = self.price_of(&product_id, variant.as_deref()).await?;
            items.push(CartItem::new(product_id, variant, quantity, unit_price));
        }

        self.carts
            .mutate(customer_id, move |cart| {
                cart.replace_items(Vec::new());
                for item in items {
                    cart.add_item(item)?;
                }
                Ok(cart.clone())
            })
            .await
    }

    /// Attaches a shipping address for the upcoming checkout.
    #[tracing::instrument(skip(self, address))]
    pub async fn attach_address(
        &self,
        customer_id: CustomerId,
        address: ShippingAddress,
    ) -> Result<Cart, CheckoutError> {
        if !address.is_complete() {
            return Err(CheckoutError::InvalidAddress(
                "missing recipient, street, city or country".to_string(),
            ));
        }

        Ok(self
            .carts
            .mutate(customer_id, move |cart| {
                cart.attach_address(address);
                cart.clone()
            })
            .await)
    }

    async fn price_of(
        &self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<Money, CheckoutError> {
        self.catalog
            .unit_price(product_id, variant)
            .await?
            .ok_or_else(|| CheckoutError::UnknownProduct(product_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::InMemoryCatalog;

    fn service() -> (CartService, InMemoryCatalog) {
        let catalog = InMemoryCatalog::new();
        catalog.set_product("JOY-001", None, Money::from_cents(1999), 10);
        catalog.set_product("JOY-002", None, Money::from_cents(4500), 10);

        let service = CartService::new(CartStore::new(), Arc::new(catalog.clone()));
        (service, catalog)
    }

    #[tokio::test]
    async fn test_add_item_captures_catalog_price() {
        let (service, _) = service();
        let customer_id = CustomerId::new();

        let cart = service
            .add_item(customer_id, ProductId::new("JOY-001"), None, 2)
            .await
            .unwrap();

        assert_eq!(cart.items()[0].unit_price.cents(), 1999);
        assert_eq!(cart.subtotal().cents(), 3998);
    }

    #[tokio::test]
    async fn test_mutation_refreshes_drifted_price() {
        let (service, catalog) = service();
        let customer_id = CustomerId::new();

        service
            .add_item(customer_id, ProductId::new("JOY-001"), None, 1)
            .await
            .unwrap();

        // Catalog price drifts between mutations.
        catalog.set_price("JOY-001", None, Money::from_cents(2499));

        let cart = service
            .add_item(customer_id, ProductId::new("JOY-001"), None, 1)
            .await
            .unwrap();

        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].unit_price.cents(), 2499);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let (service, _) = service();
        let result = service
            .add_item(CustomerId::new(), ProductId::new("JOY-404"), None, 1)
            .await;
        assert!(matches!(result, Err(CheckoutError::UnknownProduct(_))));
    }

    #[tokio::test]
    async fn test_zero_quantity_add_rejected() {
        let (service, _) = service();
        let result = service
            .add_item(CustomerId::new(), ProductId::new("JOY-001"), None, 0)
            .await;
        assert!(matches!(
            result,
            Err(CheckoutError::Cart(CartError::InvalidQuantity { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let (service, _) = service();
        let customer_id = CustomerId::new();

        service
            .add_item(customer_id, ProductId::new("JOY-001"), None, 2)
            .await
            .unwrap();

        let cart = service
            .update_quantity(customer_id, ProductId::new("JOY-001"), None, 0)
            .await
            .unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_update_negative_removes_line() {
        let (service, _) = service();
        let customer_id = CustomerId::new();

        service
            .add_item(customer_id, ProductId::new("JOY-001"), None, 2)
            .await
            .unwrap();

        let cart = service
            .update_quantity(customer_id, ProductId::new("JOY-001"), None, -3)
            .await
            .unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_replace_reprices_and_merges() {
        let (service, _) = service();
        let customer_id = CustomerId::new();

        service
            .add_item(customer_id, ProductId::new("JOY-001"), None, 5)
            .await
            .unwrap();

        let cart = service
            .replace(
                customer_id,
                vec![
                    (ProductId::new("JOY-002"), None, 1),
                    (ProductId::new("JOY-002"), None, 2),
                    (ProductId::new("JOY-001"), None, 0),
                ],
            )
            .await
            .unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].product_id.as_str(), "JOY-002");
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_attach_incomplete_address_rejected() {
        let (service, _) = service();
        let result = service
            .attach_address(
                CustomerId::new(),
                ShippingAddress {
                    recipient: String::new(),
                    line1: "Calle 10 # 5-21".to_string(),
                    line2: None,
                    city: "Bogotá".to_string(),
                    region: "Cundinamarca".to_string(),
                    postal_code: "110111".to_string(),
                    country: "CO".to_string(),
                    phone: None,
                },
            )
            .await;
        assert!(matches!(result, Err(CheckoutError::InvalidAddress(_))));
    }
}
