//! Route handlers.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use checkout::{
    CartService, CheckoutFinalizer, OrderAdminService, PaymentProcessor,
};
use gateway::PaymentGateway;
use store::OrderStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, G: PaymentGateway> {
    pub carts: CartService,
    pub finalizer: CheckoutFinalizer<S>,
    pub payments: PaymentProcessor<S, G>,
    pub admin: OrderAdminService<S>,
    pub orders: Arc<S>,
    pub gateway: Arc<G>,
}
