//! Protocol client for the external card-payment gateway.
//!
//! The gateway speaks a two-legged protocol, each leg a plain HTTPS call
//! with no shared transport state:
//! 1. a client-credentials token exchange returning a short-lived bearer
//!    token, and
//! 2. a tokenized charge (direct or 3DS) returning an approval or a
//!    rejection with a reason.
//!
//! The gateway offers no idempotency key of its own; de-duplication is the
//! caller's job (see the checkout crate). This crate only guarantees
//! honest failure classification: transport errors that cannot have
//! reached the gateway are distinguished from ambiguous outcomes that may
//! have.

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{HttpPaymentGateway, PaymentGateway};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use mock::InMemoryPaymentGateway;
pub use types::{
    AccessToken, BrowserInfo, ChargeMode, ChargeOutcome, ChargeRequest, DirectCharge,
    ThreeDsCharge,
};
