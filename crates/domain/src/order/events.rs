//! Domain events emitted on order transitions.
//!
//! Events are consumed by the external notification collaborator (email
//! sender). One event per successful transition, no more.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use super::{CustomerId, Money, Order, OrderTransition};

/// Events that can occur on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// A checkout completed and an order entered `pending_payment`.
    OrderReceived(OrderReceivedData),

    /// The gateway approved the charge.
    PaymentConfirmed(PaymentConfirmedData),

    /// The gateway rejected the charge.
    OrderFailed(OrderFailedData),

    /// An administrator cancelled the order.
    OrderCancelled(OrderCancelledData),

    /// The order was shipped.
    OrderShipped(OrderShippedData),

    /// The order was delivered.
    OrderDelivered(OrderDeliveredData),
}

impl OrderEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderReceived(_) => "OrderReceived",
            OrderEvent::PaymentConfirmed(_) => "PaymentConfirmed",
            OrderEvent::OrderFailed(_) => "OrderFailed",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
            OrderEvent::OrderShipped(_) => "OrderShipped",
            OrderEvent::OrderDelivered(_) => "OrderDelivered",
        }
    }

    /// Returns the order the event is about.
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderReceived(data) => data.order_id,
            OrderEvent::PaymentConfirmed(data) => data.order_id,
            OrderEvent::OrderFailed(data) => data.order_id,
            OrderEvent::OrderCancelled(data) => data.order_id,
            OrderEvent::OrderShipped(data) => data.order_id,
            OrderEvent::OrderDelivered(data) => data.order_id,
        }
    }

    /// Maps an applied transition to its domain event.
    ///
    /// `order` is the post-transition state. Admin overrides produce no
    /// event; they are audit-logged instead.
    pub fn for_transition(order: &Order, transition: &OrderTransition) -> Option<OrderEvent> {
        let now = Utc::now();
        match transition {
            OrderTransition::Finalize => Some(OrderEvent::OrderReceived(OrderReceivedData {
                order_id: order.id(),
                customer_id: order.customer_id(),
                total: order.total(),
                placed_at: now,
            })),
            OrderTransition::PaymentApproved { gateway_reference } => {
                Some(OrderEvent::PaymentConfirmed(PaymentConfirmedData {
                    order_id: order.id(),
                    gateway_reference: gateway_reference.clone(),
                    amount: order.total(),
                    confirmed_at: now,
                }))
            }
            OrderTransition::PaymentRejected { reason, .. } => {
                Some(OrderEvent::OrderFailed(OrderFailedData {
                    order_id: order.id(),
                    reason: reason.clone(),
                    failed_at: now,
                }))
            }
            OrderTransition::Cancel {
                cancelled_by,
                reason,
            } => Some(OrderEvent::OrderCancelled(OrderCancelledData {
                order_id: order.id(),
                cancelled_by: cancelled_by.clone(),
                reason: reason.clone(),
                cancelled_at: now,
            })),
            OrderTransition::Ship { .. } => Some(OrderEvent::OrderShipped(OrderShippedData {
                order_id: order.id(),
                shipped_at: now,
            })),
            OrderTransition::Deliver { .. } => {
                Some(OrderEvent::OrderDelivered(OrderDeliveredData {
                    order_id: order.id(),
                    delivered_at: now,
                }))
            }
            OrderTransition::Override { .. } => None,
        }
    }
}

/// Data for the OrderReceived event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceivedData {
    /// The new order.
    pub order_id: OrderId,

    /// The customer who checked out.
    pub customer_id: CustomerId,

    /// Frozen order total.
    pub total: Money,

    /// When the checkout finalized.
    pub placed_at: DateTime<Utc>,
}

/// Data for the PaymentConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedData {
    /// The paid order.
    pub order_id: OrderId,

    /// Transaction ID assigned by the gateway.
    pub gateway_reference: String,

    /// Amount charged.
    pub amount: Money,

    /// When the approval was recorded.
    pub confirmed_at: DateTime<Utc>,
}

/// Data for the OrderFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFailedData {
    /// The rejected order.
    pub order_id: OrderId,

    /// Rejection reason reported by the gateway.
    pub reason: String,

    /// When the rejection was recorded.
    pub failed_at: DateTime<Utc>,
}

/// Data for the OrderCancelled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    /// The cancelled order.
    pub order_id: OrderId,

    /// Who cancelled the order.
    pub cancelled_by: String,

    /// Why the order was cancelled.
    pub reason: String,

    /// When the cancellation was recorded.
    pub cancelled_at: DateTime<Utc>,
}

/// Data for the OrderShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderShippedData {
    /// The shipped order.
    pub order_id: OrderId,

    /// When the shipment was recorded.
    pub shipped_at: DateTime<Utc>,
}

/// Data for the OrderDelivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDeliveredData {
    /// The delivered order.
    pub order_id: OrderId,

    /// When the delivery was recorded.
    pub delivered_at: DateTime<Utc>,
}
