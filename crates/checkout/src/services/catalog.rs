//! Catalog service trait and in-memory implementation.
//!
//! The product catalog is owned externally; this core only reads current
//! unit prices (captured onto cart lines at mutation time) and live stock
//! (re-validated at checkout).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Money, ProductId};

use crate::error::CheckoutError;

/// Trait for catalog lookups.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Returns the current unit price, or None if the product (or variant)
    /// is not in the catalog.
    async fn unit_price(
        &self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<Option<Money>, CheckoutError>;

    /// Returns the units currently available for sale.
    async fn stock_on_hand(
        &self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<u32, CheckoutError>;
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    price: Money,
    stock: u32,
}

/// In-memory catalog for testing and the default server state.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    entries: Arc<RwLock<HashMap<(String, Option<String>), CatalogEntry>>>,
}

impl InMemoryCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a product entry.
    pub fn set_product(
        &self,
        product_id: impl Into<String>,
        variant: Option<&str>,
        price: Money,
        stock: u32,
    ) {
        self.entries.write().unwrap().insert(
            (product_id.into(), variant.map(str::to_string)),
            CatalogEntry { price, stock },
        );
    }

    /// Updates the stock of an existing entry; no-op if it doesn't exist.
    pub fn set_stock(&self, product_id: &str, variant: Option<&str>, stock: u32) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) =
            entries.get_mut(&(product_id.to_string(), variant.map(str::to_string)))
        {
            entry.stock = stock;
        }
    }

    /// Updates the price of an existing entry; no-op if it doesn't exist.
    pub fn set_price(&self, product_id: &str, variant: Option<&str>, price: Money) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) =
            entries.get_mut(&(product_id.to_string(), variant.map(str::to_string)))
        {
            entry.price = price;
        }
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn unit_price(
        &self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<Option<Money>, CheckoutError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .get(&(product_id.to_string(), variant.map(str::to_string)))
            .map(|entry| entry.price))
    }

    async fn stock_on_hand(
        &self,
        product_id: &ProductId,
        variant: Option<&str>,
    ) -> Result<u32, CheckoutError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .get(&(product_id.to_string(), variant.map(str::to_string)))
            .map(|entry| entry.stock)
            .unwrap_or(0))
    }
}
