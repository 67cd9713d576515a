use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Version};
use domain::{CustomerId, Order, OrderTransition};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    order_store::{OrderStore, TransitionRecord},
};

/// In-memory order store implementation.
///
/// Backs the default server state and the test suites; provides the same
/// interface and concurrency semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.id()) {
            return Err(StoreError::DuplicateOrder(order.id()));
        }

        orders.insert(order.id(), order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| order.customer_id() == customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(result)
    }

    async fn apply_transition(
        &self,
        order_id: OrderId,
        expected_version: Version,
        transition: OrderTransition,
    ) -> Result<TransitionRecord> {
        // The write lock is held across check-and-apply, so concurrent
        // transitions on the same order are serialized and exactly one of
        // two same-version submissions can win.
        let mut orders = self.orders.write().await;

        let stored = orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if stored.version() != expected_version {
            return Err(StoreError::StaleOrderVersion {
                order_id,
                expected: expected_version,
                actual: stored.version(),
            });
        }

        let mut order = stored.clone();
        let previous = order.apply(&transition)?;
        orders.insert(order_id, order.clone());

        metrics::counter!("order_transitions_total").increment(1);
        tracing::debug!(
            %order_id,
            transition = transition.label(),
            from = %previous,
            to = %order.status(),
            "order transition applied"
        );

        Ok(TransitionRecord {
            order,
            previous,
            transition,
        })
    }
}
