//! Domain layer for the cart-to-order lifecycle.
//!
//! This crate provides the core domain model:
//! - Money and pricing value objects
//! - The mutable cart aggregate with line-level merge semantics
//! - The immutable-once-priced order aggregate and its state machine
//! - Domain events emitted on order transitions

pub mod cart;
pub mod order;

pub use cart::{Cart, CartError, CartItem};
pub use order::{
    CustomerId, Money, Order, OrderCharges, OrderError, OrderEvent, OrderLine, OrderStatus,
    OrderTransition, ProductId, ShippingAddress,
};
