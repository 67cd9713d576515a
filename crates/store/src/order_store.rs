use async_trait::async_trait;
use common::{OrderId, Version};
use domain::{CustomerId, Order, OrderStatus, OrderTransition};

use crate::Result;

/// The result of a successfully applied transition.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    /// The order after the transition.
    pub order: Order,

    /// The status the order was in before the transition.
    pub previous: OrderStatus,

    /// The transition that was applied, echoed back for event mapping.
    pub transition: OrderTransition,
}

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync). Transitions on a
/// single order are linearized through the expected-version check;
/// transitions on different orders are fully independent.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a newly finalized order.
    ///
    /// Fails with `DuplicateOrder` if the ID already exists.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Retrieves an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Retrieves all orders of a customer, newest first.
    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;

    /// Applies a transition to an order.
    ///
    /// The transition is applied only if the stored version matches
    /// `expected_version`; otherwise the call fails with
    /// `StaleOrderVersion` and the order is left untouched. Transition
    /// legality is validated by the order aggregate.
    async fn apply_transition(
        &self,
        order_id: OrderId,
        expected_version: Version,
        transition: OrderTransition,
    ) -> Result<TransitionRecord>;
}
