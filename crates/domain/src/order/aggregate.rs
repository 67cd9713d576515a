//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, Version};
use serde::{Deserialize, Serialize};

use super::{
    CustomerId, Money, OrderCharges, OrderError, OrderLine, OrderStatus, ShippingAddress,
};

/// A requested change of order status.
///
/// Transitions carry the data the new status needs (gateway reference,
/// audit actor, rejection reason). Legality against the current status is
/// validated in [`Order::apply`]; the expected-version check happens in the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderTransition {
    /// Checkout finalize: `cart -> pending_payment`.
    Finalize,

    /// Gateway approved the charge: `pending_payment -> pagado`.
    PaymentApproved {
        /// Transaction ID assigned by the gateway.
        gateway_reference: String,
    },

    /// Gateway rejected the charge: `pending_payment -> no_pagado`.
    PaymentRejected {
        /// Transaction ID, when the gateway assigned one to the rejection.
        gateway_reference: Option<String>,
        /// Rejection reason reported by the gateway.
        reason: String,
    },

    /// Administrator cancelled the order: `pending_payment -> cancelado`.
    Cancel {
        /// Who cancelled the order.
        cancelled_by: String,
        /// Why the order was cancelled.
        reason: String,
    },

    /// Administrator marked the order shipped: `pagado -> en_camino`.
    Ship {
        /// Who recorded the shipment.
        updated_by: String,
    },

    /// Administrator marked the order delivered: `en_camino -> entregado`.
    Deliver {
        /// Who recorded the delivery.
        updated_by: String,
    },

    /// Administrator override to an arbitrary status.
    ///
    /// Bypasses the legality table; always logged, never silent.
    Override {
        /// Target status.
        to: OrderStatus,
        /// Who performed the override.
        actor: String,
        /// Why the override was necessary.
        reason: String,
    },
}

impl OrderTransition {
    /// Returns the status this transition moves the order to.
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderTransition::Finalize => OrderStatus::PendingPayment,
            OrderTransition::PaymentApproved { .. } => OrderStatus::Paid,
            OrderTransition::PaymentRejected { .. } => OrderStatus::Unpaid,
            OrderTransition::Cancel { .. } => OrderStatus::Cancelled,
            OrderTransition::Ship { .. } => OrderStatus::Shipped,
            OrderTransition::Deliver { .. } => OrderStatus::Delivered,
            OrderTransition::Override { to, .. } => *to,
        }
    }

    /// Returns a short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            OrderTransition::Finalize => "finalize",
            OrderTransition::PaymentApproved { .. } => "payment_approved",
            OrderTransition::PaymentRejected { .. } => "payment_rejected",
            OrderTransition::Cancel { .. } => "cancel",
            OrderTransition::Ship { .. } => "ship",
            OrderTransition::Deliver { .. } => "deliver",
            OrderTransition::Override { .. } => "override",
        }
    }
}

/// Order aggregate root.
///
/// Lines, charges and the total are computed once at construction and never
/// change afterward; only `status`, `gateway_reference`, `version` and
/// `updated_at` move, and only through [`Order::apply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier, also the gateway idempotency reference.
    id: OrderId,

    /// Customer who placed the order.
    customer_id: CustomerId,

    /// Frozen order lines.
    lines: Vec<OrderLine>,

    /// Shipping destination.
    shipping_address: ShippingAddress,

    /// Shipping/tax/discount components.
    charges: OrderCharges,

    /// Frozen total: `Σ subtotal + shipping + tax - discount`.
    total: Money,

    /// Current lifecycle status.
    status: OrderStatus,

    /// Transaction ID returned by the gateway, set once a charge attempt
    /// completes.
    gateway_reference: Option<String>,

    /// Monotonic counter for optimistic concurrency.
    version: Version,

    /// When the order was created.
    created_at: DateTime<Utc>,

    /// When the order was last transitioned.
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in `cart` status from frozen lines.
    ///
    /// The total is computed here, once. The checkout finalizer applies the
    /// [`OrderTransition::Finalize`] transition before persisting.
    pub fn new(
        id: OrderId,
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        charges: OrderCharges,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoLines);
        }

        let subtotal: Money = lines.iter().map(|line| line.subtotal).sum();
        let now = Utc::now();

        Ok(Self {
            id,
            customer_id,
            lines,
            shipping_address,
            charges,
            total: charges.applied_to(subtotal),
            status: OrderStatus::Cart,
            gateway_reference: None,
            version: Version::initial(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from stored fields.
    ///
    /// For storage adapters only; performs no recomputation or validation.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: OrderId,
        customer_id: CustomerId,
        lines: Vec<OrderLine>,
        shipping_address: ShippingAddress,
        charges: OrderCharges,
        total: Money,
        status: OrderStatus,
        gateway_reference: Option<String>,
        version: Version,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            lines,
            shipping_address,
            charges,
            total,
            status,
            gateway_reference,
            version,
            created_at,
            updated_at,
        }
    }

    /// Applies a transition, validating legality against the current status.
    ///
    /// Returns the previous status on success. On error the order is
    /// unchanged: status and version stay as they were.
    pub fn apply(&mut self, transition: &OrderTransition) -> Result<OrderStatus, OrderError> {
        let from = self.status;
        let to = transition.target();

        match transition {
            OrderTransition::Override { actor, reason, .. } => {
                tracing::warn!(
                    order_id = %self.id,
                    %from,
                    %to,
                    actor,
                    reason,
                    "admin override transition"
                );
            }
            _ => {
                if !from.can_transition_to(to) {
                    return Err(OrderError::IllegalTransition { from, to });
                }
            }
        }

        match transition {
            OrderTransition::PaymentApproved { gateway_reference } => {
                self.gateway_reference = Some(gateway_reference.clone());
            }
            OrderTransition::PaymentRejected {
                gateway_reference, ..
            } => {
                if gateway_reference.is_some() {
                    self.gateway_reference = gateway_reference.clone();
                }
            }
            _ => {}
        }

        self.status = to;
        self.version = self.version.next();
        self.updated_at = Utc::now();

        Ok(from)
    }
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the customer ID.
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    /// Returns the frozen order lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    /// Returns the shipping/tax/discount components.
    pub fn charges(&self) -> OrderCharges {
        self.charges
    }

    /// Returns the sum of line subtotals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|line| line.subtotal).sum()
    }

    /// Returns the frozen total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the gateway transaction reference, if a charge completed.
    pub fn gateway_reference(&self) -> Option<&str> {
        self.gateway_reference.as_deref()
    }

    /// Returns the current version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the order was last transitioned.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
