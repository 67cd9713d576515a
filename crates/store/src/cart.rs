use std::collections::HashMap;
use std::sync::Arc;

use domain::{Cart, CustomerId};
use tokio::sync::{Mutex, RwLock};

/// In-memory store of active carts, one per customer.
///
/// Mutations to the same cart are serialized through a per-customer mutex,
/// so two concurrent line insertions both land (merge at line granularity,
/// never overwrite of the whole cart). Carts for different customers don't
/// contend. Abandoned carts simply stay here; no TTL is enforced.
#[derive(Clone, Default)]
pub struct CartStore {
    carts: Arc<RwLock<HashMap<CustomerId, Arc<Mutex<Cart>>>>>,
}

impl CartStore {
    /// Creates a new empty cart store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, customer_id: CustomerId) -> Arc<Mutex<Cart>> {
        if let Some(slot) = self.carts.read().await.get(&customer_id) {
            return slot.clone();
        }

        let mut carts = self.carts.write().await;
        carts
            .entry(customer_id)
            .or_insert_with(|| Arc::new(Mutex::new(Cart::new(customer_id))))
            .clone()
    }

    /// Returns a snapshot of the customer's active cart.
    pub async fn read(&self, customer_id: CustomerId) -> Cart {
        let slot = self.slot(customer_id).await;
        let cart = slot.lock().await;
        cart.clone()
    }

    /// Runs a mutation against the customer's cart under its lock.
    pub async fn mutate<F, R>(&self, customer_id: CustomerId, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let slot = self.slot(customer_id).await;
        let mut cart = slot.lock().await;
        f(&mut cart)
    }

    /// Removes and returns the customer's cart, leaving a fresh empty one.
    ///
    /// Used at checkout: the returned cart becomes the order; mutations
    /// arriving afterwards start a new cart.
    pub async fn take(&self, customer_id: CustomerId) -> Cart {
        let slot = self.slot(customer_id).await;
        let mut cart = slot.lock().await;
        std::mem::replace(&mut *cart, Cart::new(customer_id))
    }

    /// Replaces the customer's cart wholesale.
    pub async fn put(&self, customer_id: CustomerId, new_cart: Cart) {
        let slot = self.slot(customer_id).await;
        let mut cart = slot.lock().await;
        *cart = new_cart;
    }
}
