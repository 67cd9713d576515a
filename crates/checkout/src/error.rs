//! Checkout error types.

use common::OrderId;
use domain::{CartError, OrderError, OrderStatus};
use gateway::GatewayError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during checkout and payment operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines; nothing to finalize.
    #[error("cart is empty")]
    EmptyCart,

    /// Live stock cannot cover a cart line. No partial orders are created.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    OutOfStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// The shipping address is missing or incomplete.
    #[error("invalid shipping address: {0}")]
    InvalidAddress(String),

    /// The product is not in the catalog.
    #[error("unknown product: {0}")]
    UnknownProduct(String),

    /// The catalog collaborator failed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A charge for this order already succeeded or is in flight.
    /// Rejected locally; the gateway is never contacted.
    #[error("duplicate charge attempt for order {0}")]
    DuplicateChargeAttempt(OrderId),

    /// The order was not found.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order is not awaiting payment.
    #[error("order {order_id} is not payable in status {status}")]
    OrderNotPayable {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A settled charge could not be recorded because the order changed
    /// state while the charge was in flight. Requires admin resolution.
    #[error(
        "settlement conflict for order {order_id}: order moved to {status} while the charge was in flight"
    )]
    SettlementConflict {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A cart mutation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An order aggregate operation failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
