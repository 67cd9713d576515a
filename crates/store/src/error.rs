use common::{OrderId, Version};
use domain::OrderError;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected version did not match the stored version.
    ///
    /// The caller must re-fetch the order and decide whether to retry.
    #[error("stale version for order {order_id}: expected {expected}, found {actual}")]
    StaleOrderVersion {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// The order was not found in the store.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID already exists.
    #[error("order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The requested transition is not legal for the current status.
    #[error(transparent)]
    Transition(#[from] OrderError),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
