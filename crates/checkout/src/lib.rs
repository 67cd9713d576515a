//! Checkout orchestration: everything between a cart mutation and a paid
//! order.
//!
//! The flow is: the [`CartService`] accumulates line items with
//! catalog-captured prices, the [`CheckoutFinalizer`] locks prices into an
//! immutable order in `pending_payment`, and the [`PaymentProcessor`]
//! drives the gateway charge and applies the guarded transition, emitting
//! one domain event per transition through the
//! [`NotificationDispatcher`].

pub mod admin;
pub mod cart;
pub mod dispatcher;
pub mod error;
pub mod finalizer;
pub mod payment;
pub mod services;

pub use admin::OrderAdminService;
pub use cart::CartService;
pub use dispatcher::NotificationDispatcher;
pub use error::CheckoutError;
pub use finalizer::CheckoutFinalizer;
pub use payment::{PaymentOutcome, PaymentProcessor};
pub use services::catalog::{CatalogService, InMemoryCatalog};
pub use services::notifier::{LogNotifier, Notifier, NotifyError, RecordingNotifier};
