//! Checkout finalizer: converts a mutable cart into an immutable priced
//! order.

use std::sync::Arc;

use common::OrderId;
use domain::{
    CustomerId, Order, OrderCharges, OrderEvent, OrderLine, OrderTransition, ShippingAddress,
};
use store::{CartStore, OrderStore};

use crate::dispatcher::NotificationDispatcher;
use crate::error::CheckoutError;
use crate::services::catalog::CatalogService;

/// Converts the customer's active cart into an order in `pending_payment`.
pub struct CheckoutFinalizer<S: OrderStore> {
    carts: CartStore,
    orders: Arc<S>,
    catalog: Arc<dyn CatalogService>,
    dispatcher: NotificationDispatcher,
}

impl<S: OrderStore> CheckoutFinalizer<S> {
    /// Creates a new finalizer.
    pub fn new(
        carts: CartStore,
        orders: Arc<S>,
        catalog: Arc<dyn CatalogService>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            carts,
            orders,
            catalog,
            dispatcher,
        }
    }

    /// Finalizes the customer's cart into an order.
    ///
    /// Validation (empty cart, address, live stock) happens before any
    /// write; a failure leaves both the cart and the order store
    /// untouched. Prices are the cart-captured snapshot, totals are
    /// computed once, and the cart is destroyed only after the order is
    /// safely persisted.
    #[tracing::instrument(skip(self, address, charges))]
    pub async fn finalize(
        &self,
        customer_id: CustomerId,
        address: Option<ShippingAddress>,
        charges: OrderCharges,
    ) -> Result<Order, CheckoutError> {
        let cart = self.carts.read(customer_id).await;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let address = address
            .or_else(|| cart.shipping_address().cloned())
            .ok_or_else(|| {
                CheckoutError::InvalidAddress("no shipping address attached".to_string())
            })?;
        if !address.is_complete() {
            return Err(CheckoutError::InvalidAddress(
                "missing recipient, street, city or country".to_string(),
            ));
        }

        // Re-validate every line against live stock. No partial orders:
        // the first shortage fails the whole checkout.
        for item in cart.items() {
            let available = self
                .catalog
                .stock_on_hand(&item.product_id, item.variant.as_deref())
                .await?;
            if available < item.quantity {
                return Err(CheckoutError::OutOfStock {
                    product_id: item.product_id.to_string(),
                    requested: item.quantity,
                    available,
                });
            }
        }

        let lines: Vec<OrderLine> = cart
            .items()
            .iter()
            .map(|item| {
                OrderLine::new(
                    item.product_id.clone(),
                    item.variant.clone(),
                    item.quantity,
                    item.unit_price,
                )
            })
            .collect();

        let mut order = Order::new(OrderId::new(), customer_id, lines, address, charges)?;
        let transition = OrderTransition::Finalize;
        order.apply(&transition)?;

        self.orders.insert(order.clone()).await?;

        // The cart is destroyed only once the order exists.
        self.carts.take(customer_id).await;

        metrics::counter!("orders_finalized_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            %customer_id,
            total_cents = order.total().cents(),
            "checkout finalized"
        );

        if let Some(event) = OrderEvent::for_transition(&order, &transition) {
            self.dispatcher.emit(event).await;
        }

        Ok(order)
    }
}
