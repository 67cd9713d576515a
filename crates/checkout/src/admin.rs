//! Admin-driven order transitions.
//!
//! Authorization (role checks) is the caller's problem; legality against
//! the current status and the expected-version guard are enforced here.

use std::sync::Arc;

use common::{OrderId, Version};
use domain::{Order, OrderTransition};
use store::OrderStore;

use crate::dispatcher::NotificationDispatcher;
use crate::error::CheckoutError;

/// Applies admin transitions (cancel, ship, deliver) with event dispatch.
pub struct OrderAdminService<S: OrderStore> {
    orders: Arc<S>,
    dispatcher: NotificationDispatcher,
}

impl<S: OrderStore> OrderAdminService<S> {
    /// Creates a new admin service.
    pub fn new(orders: Arc<S>, dispatcher: NotificationDispatcher) -> Self {
        Self { orders, dispatcher }
    }

    /// Cancels an order awaiting payment.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel(
        &self,
        order_id: OrderId,
        expected_version: Version,
        cancelled_by: impl Into<String> + std::fmt::Debug,
        reason: impl Into<String>,
    ) -> Result<Order, CheckoutError> {
        self.apply(
            order_id,
            expected_version,
            OrderTransition::Cancel {
                cancelled_by: cancelled_by.into(),
                reason: reason.into(),
            },
        )
        .await
    }

    /// Marks a paid order shipped.
    #[tracing::instrument(skip(self))]
    pub async fn ship(
        &self,
        order_id: OrderId,
        expected_version: Version,
        updated_by: impl Into<String> + std::fmt::Debug,
    ) -> Result<Order, CheckoutError> {
        self.apply(
            order_id,
            expected_version,
            OrderTransition::Ship {
                updated_by: updated_by.into(),
            },
        )
        .await
    }

    /// Marks a shipped order delivered.
    #[tracing::instrument(skip(self))]
    pub async fn deliver(
        &self,
        order_id: OrderId,
        expected_version: Version,
        updated_by: impl Into<String> + std::fmt::Debug,
    ) -> Result<Order, CheckoutError> {
        self.apply(
            order_id,
            expected_version,
            OrderTransition::Deliver {
                updated_by: updated_by.into(),
            },
        )
        .await
    }

    async fn apply(
        &self,
        order_id: OrderId,
        expected_version: Version,
        transition: OrderTransition,
    ) -> Result<Order, CheckoutError> {
        let record = self
            .orders
            .apply_transition(order_id, expected_version, transition)
            .await?;

        self.dispatcher.dispatch(&record).await;
        Ok(record.order)
    }
}
