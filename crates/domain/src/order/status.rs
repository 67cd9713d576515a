//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Serialized names are the legacy wire values persisted by the platform.
///
/// Status transitions:
/// ```text
/// cart ──► pending_payment ──┬──► pagado ──► en_camino ──► entregado
///                            ├──► no_pagado
///                            └──► cancelado
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Pre-checkout: items may still change, nothing is priced.
    #[default]
    #[serde(rename = "cart")]
    Cart,

    /// Checkout finalized, totals frozen, awaiting a gateway outcome.
    #[serde(rename = "pending_payment")]
    PendingPayment,

    /// Gateway approved the charge (terminal for the payment leg).
    #[serde(rename = "pagado")]
    Paid,

    /// Gateway rejected the charge (terminal for the payment leg).
    #[serde(rename = "no_pagado")]
    Unpaid,

    /// Cancelled by an administrator before payment (terminal state).
    #[serde(rename = "cancelado")]
    Cancelled,

    /// Shipped to the customer.
    #[serde(rename = "en_camino")]
    Shipped,

    /// Delivered (terminal state).
    #[serde(rename = "entregado")]
    Delivered,
}

impl OrderStatus {
    /// Returns true if `to` is a legal transition target from this status.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Cart, OrderStatus::PendingPayment)
                | (OrderStatus::PendingPayment, OrderStatus::Paid)
                | (OrderStatus::PendingPayment, OrderStatus::Unpaid)
                | (OrderStatus::PendingPayment, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }

    /// Returns true if a payment outcome can be recorded in this status.
    pub fn can_record_payment(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment)
    }

    /// Returns true if this is a terminal status (no legal transitions out).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Unpaid | OrderStatus::Cancelled | OrderStatus::Delivered
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Cart => "cart",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "pagado",
            OrderStatus::Unpaid => "no_pagado",
            OrderStatus::Cancelled => "cancelado",
            OrderStatus::Shipped => "en_camino",
            OrderStatus::Delivered => "entregado",
        }
    }

    /// Parses a wire name back into a status.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "cart" => Some(OrderStatus::Cart),
            "pending_payment" => Some(OrderStatus::PendingPayment),
            "pagado" => Some(OrderStatus::Paid),
            "no_pagado" => Some(OrderStatus::Unpaid),
            "cancelado" => Some(OrderStatus::Cancelled),
            "en_camino" => Some(OrderStatus::Shipped),
            "entregado" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [OrderStatus; 7] {
        [
            OrderStatus::Cart,
            OrderStatus::PendingPayment,
            OrderStatus::Paid,
            OrderStatus::Unpaid,
            OrderStatus::Cancelled,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ]
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
