//! Persistence layer for carts and orders.
//!
//! Orders live behind the [`OrderStore`] trait with in-memory and
//! PostgreSQL implementations; every transition is guarded by an expected
//! version. Carts are in-memory only, serialized per customer.

pub mod cart;
pub mod error;
pub mod memory;
pub mod order_store;
pub mod postgres;

pub use cart::CartStore;
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use order_store::{OrderStore, TransitionRecord};
pub use postgres::PostgresOrderStore;
