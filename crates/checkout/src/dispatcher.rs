//! Notification dispatch on order transitions.

use std::sync::Arc;

use domain::OrderEvent;
use store::TransitionRecord;

use crate::services::notifier::Notifier;

/// Emits exactly one domain event per successful transition.
///
/// Dispatch happens after the transition is committed; a failed delivery
/// is logged and never rolls the transition back or surfaces to the
/// caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over a notification sink.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Emits the domain event for an applied transition, if it maps to one.
    pub async fn dispatch(&self, record: &TransitionRecord) {
        if let Some(event) = OrderEvent::for_transition(&record.order, &record.transition) {
            self.emit(event).await;
        }
    }

    /// Hands an event to the sink, swallowing delivery failures.
    pub async fn emit(&self, event: OrderEvent) {
        metrics::counter!("notifications_emitted_total").increment(1);

        let event_type = event.event_type();
        let order_id = event.order_id();

        if let Err(e) = self.notifier.notify(event).await {
            tracing::warn!(
                %order_id,
                event_type,
                error = %e,
                "notification delivery failed; transition unaffected"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;
    use domain::{
        CustomerId, Money, Order, OrderCharges, OrderLine, OrderTransition, ShippingAddress,
    };
    use store::TransitionRecord;

    use crate::services::notifier::RecordingNotifier;

    fn record() -> TransitionRecord {
        let mut order = Order::new(
            OrderId::new(),
            CustomerId::new(),
            vec![OrderLine::new("JOY-001", None, 1, Money::from_cents(5000))],
            ShippingAddress {
                recipient: "Ana Torres".to_string(),
                line1: "Calle 10 # 5-21".to_string(),
                line2: None,
                city: "Bogotá".to_string(),
                region: "Cundinamarca".to_string(),
                postal_code: "110111".to_string(),
                country: "CO".to_string(),
                phone: None,
            },
            OrderCharges::default(),
        )
        .unwrap();
        order.apply(&OrderTransition::Finalize).unwrap();

        let transition = OrderTransition::PaymentApproved {
            gateway_reference: "TX-1".to_string(),
        };
        let previous = order.apply(&transition).unwrap();

        TransitionRecord {
            order,
            previous,
            transition,
        }
    }

    #[tokio::test]
    async fn test_dispatch_emits_one_event() {
        let notifier = RecordingNotifier::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()));

        dispatcher.dispatch(&record()).await;

        assert_eq!(notifier.count_of("PaymentConfirmed"), 1);
        assert_eq!(notifier.events().len(), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let notifier = RecordingNotifier::new();
        notifier.set_fail(true);
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()));

        // Must not panic or propagate.
        dispatcher.dispatch(&record()).await;

        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_override_transition_emits_nothing() {
        let notifier = RecordingNotifier::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()));

        let mut record = record();
        record.transition = OrderTransition::Override {
            to: domain::OrderStatus::Cancelled,
            actor: "admin".to_string(),
            reason: "cleanup".to_string(),
        };

        dispatcher.dispatch(&record).await;
        assert!(notifier.events().is_empty());
    }
}
