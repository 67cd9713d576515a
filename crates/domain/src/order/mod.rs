//! Order aggregate and related types.

mod aggregate;
mod events;
mod status;
mod value_objects;

pub use aggregate::{Order, OrderTransition};
pub use events::{
    OrderCancelledData, OrderDeliveredData, OrderEvent, OrderFailedData, OrderReceivedData,
    OrderShippedData, PaymentConfirmedData,
};
pub use status::OrderStatus;
pub use value_objects::{
    CustomerId, Money, OrderCharges, OrderLine, ProductId, ShippingAddress,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested transition is not in the lifecycle graph.
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// An order cannot be created without lines.
    #[error("order has no lines")]
    NoLines,
}
