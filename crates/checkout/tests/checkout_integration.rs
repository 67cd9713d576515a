//! Integration tests for the cart-to-order-to-payment flow.

use std::sync::Arc;
use std::time::Duration;

use checkout::{
    CartService, CheckoutError, CheckoutFinalizer, InMemoryCatalog, NotificationDispatcher,
    PaymentOutcome, PaymentProcessor, RecordingNotifier,
};
use common::Version;
use domain::{
    CustomerId, Money, OrderCharges, OrderStatus, OrderTransition, ProductId, ShippingAddress,
};
use gateway::{ChargeMode, DirectCharge, GatewayError, InMemoryPaymentGateway};
use store::{CartStore, InMemoryOrderStore, OrderStore};

struct TestHarness {
    carts: CartService,
    finalizer: CheckoutFinalizer<InMemoryOrderStore>,
    payments: PaymentProcessor<InMemoryOrderStore, InMemoryPaymentGateway>,
    orders: Arc<InMemoryOrderStore>,
    gateway: InMemoryPaymentGateway,
    catalog: InMemoryCatalog,
    notifier: RecordingNotifier,
}

impl TestHarness {
    fn new() -> Self {
        let cart_store = CartStore::new();
        let orders = Arc::new(InMemoryOrderStore::new());
        let gateway = InMemoryPaymentGateway::new();
        let catalog = InMemoryCatalog::new();
        catalog.set_product("P1", None, Money::from_cents(1999), 100);
        catalog.set_product("P2", None, Money::from_cents(4500), 100);

        let notifier = RecordingNotifier::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()));

        let carts = CartService::new(cart_store.clone(), Arc::new(catalog.clone()));
        let finalizer = CheckoutFinalizer::new(
            cart_store,
            orders.clone(),
            Arc::new(catalog.clone()),
            dispatcher.clone(),
        );
        let payments = PaymentProcessor::new(
            orders.clone(),
            Arc::new(gateway.clone()),
            dispatcher,
            "COP",
        );

        Self {
            carts,
            finalizer,
            payments,
            orders,
            gateway,
            catalog,
            notifier,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            recipient: "Ana Torres".to_string(),
            line1: "Calle 10 # 5-21".to_string(),
            line2: None,
            city: "Bogotá".to_string(),
            region: "Cundinamarca".to_string(),
            postal_code: "110111".to_string(),
            country: "CO".to_string(),
            phone: None,
        }
    }

    fn charge_mode() -> ChargeMode {
        ChargeMode::Direct(DirectCharge {
            card_token: "tok_test_123".to_string(),
            installments: 1,
            customer_email: "ana@example.com".to_string(),
        })
    }

    /// Cart with one line P1 x2 @ 1999, shipping 500 -> order total 4498.
    async fn finalized_order(&self) -> domain::Order {
        let customer_id = CustomerId::new();
        self.carts
            .add_item(customer_id, ProductId::new("P1"), None, 2)
            .await
            .unwrap();
        self.finalizer
            .finalize(
                customer_id,
                Some(Self::address()),
                OrderCharges::from_cents(500, 0, 0),
            )
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_checkout_and_approved_charge_end_to_end() {
    let h = TestHarness::new();

    let order = h.finalized_order().await;
    assert_eq!(order.total().cents(), 4498);
    assert_eq!(order.status(), OrderStatus::PendingPayment);

    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();

    let paid = match outcome {
        PaymentOutcome::Approved { order } => order,
        other => panic!("expected approval, got {other:?}"),
    };
    assert_eq!(paid.status(), OrderStatus::Paid);
    assert!(paid.gateway_reference().is_some());
    assert_eq!(paid.total().cents(), 4498);

    assert_eq!(h.notifier.count_of("OrderReceived"), 1);
    assert_eq!(h.notifier.count_of("PaymentConfirmed"), 1);

    // A second identical charge call is rejected without contacting the
    // gateway.
    let second = h
        .payments
        .pay(paid.id(), TestHarness::charge_mode())
        .await;
    assert!(matches!(
        second,
        Err(CheckoutError::DuplicateChargeAttempt(_))
    ));
    assert_eq!(h.gateway.charge_attempts(), 1);
    assert_eq!(h.gateway.token_requests(), 1);
    assert_eq!(h.notifier.count_of("PaymentConfirmed"), 1);
}

#[tokio::test]
async fn test_concurrent_charges_forward_exactly_one() {
    let h = TestHarness::new();
    let order = h.finalized_order().await;

    let first = {
        let payments = h.payments.clone();
        let order_id = order.id();
        tokio::spawn(async move { payments.pay(order_id, TestHarness::charge_mode()).await })
    };
    let second = {
        let payments = h.payments.clone();
        let order_id = order.id();
        tokio::spawn(async move { payments.pay(order_id, TestHarness::charge_mode()).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];

    let approvals = results
        .iter()
        .filter(|r| matches!(r, Ok(PaymentOutcome::Approved { .. })))
        .count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::DuplicateChargeAttempt(_))))
        .count();

    assert_eq!(approvals, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(h.gateway.charge_attempts(), 1);
}

#[tokio::test]
async fn test_rejected_charge_moves_order_to_unpaid() {
    let h = TestHarness::new();
    h.gateway.set_decline("fondos insuficientes");
    let order = h.finalized_order().await;

    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();

    match outcome {
        PaymentOutcome::Rejected { order, reason } => {
            assert_eq!(order.status(), OrderStatus::Unpaid);
            assert_eq!(reason, "fondos insuficientes");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    assert_eq!(h.notifier.count_of("OrderFailed"), 1);

    // A failed payment is terminal: the order never re-enters
    // pending_payment; a new attempt is rejected locally.
    let retry = h.payments.pay(order.id(), TestHarness::charge_mode()).await;
    assert!(retry.is_err());
    assert_eq!(h.gateway.charge_attempts(), 1);
}

#[tokio::test]
async fn test_token_failure_leaves_order_pending_and_retryable() {
    let h = TestHarness::new();
    h.gateway.set_fail_token(true);
    let order = h.finalized_order().await;

    let result = h.payments.pay(order.id(), TestHarness::charge_mode()).await;
    assert!(matches!(
        result,
        Err(CheckoutError::Gateway(
            GatewayError::TokenAcquisitionFailed(_)
        ))
    ));
    assert_eq!(h.gateway.charge_attempts(), 0);

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::PendingPayment);

    // The identity endpoint recovers; the retry goes through.
    h.gateway.set_fail_token(false);
    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();
    assert!(matches!(outcome, PaymentOutcome::Approved { .. }));
}

#[tokio::test]
async fn test_ambiguous_charge_that_landed_is_reconciled() {
    let h = TestHarness::new();
    h.gateway.set_timeout(true);
    let order = h.finalized_order().await;

    // The charge times out but actually landed; the lookup resolves it.
    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();

    assert!(matches!(outcome, PaymentOutcome::Approved { .. }));

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Paid);
    assert_eq!(h.notifier.count_of("PaymentConfirmed"), 1);
}

#[tokio::test]
async fn test_ambiguous_charge_that_never_landed_stays_pending() {
    let h = TestHarness::new();
    h.gateway.set_timeout(false);
    let order = h.finalized_order().await;

    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        PaymentOutcome::PendingConfirmation { .. }
    ));

    // Never guessed into pagado or no_pagado.
    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::PendingPayment);
    assert!(stored.gateway_reference().is_none());

    // The lookup proved no charge landed, so a fresh attempt is safe.
    h.gateway.set_approve();
    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();
    assert!(matches!(outcome, PaymentOutcome::Approved { .. }));
}

#[tokio::test]
async fn test_unavailable_reconciliation_blocks_new_charges() {
    let h = TestHarness::new();
    h.gateway.set_timeout(false);
    h.gateway.set_lookup_unavailable(true);
    let order = h.finalized_order().await;

    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        PaymentOutcome::PendingConfirmation { .. }
    ));
    assert_eq!(h.gateway.charge_attempts(), 1);

    // While the earlier attempt is unresolved, a new pay call reconciles
    // instead of submitting a second charge.
    h.gateway.set_approve();
    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        PaymentOutcome::PendingConfirmation { .. }
    ));
    assert_eq!(h.gateway.charge_attempts(), 1);

    // Lookup comes back and shows nothing landed; the next attempt
    // charges for real.
    h.gateway.set_lookup_unavailable(false);
    let outcome = h
        .payments
        .reconcile(order.id())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        PaymentOutcome::PendingConfirmation { .. }
    ));

    let outcome = h
        .payments
        .pay(order.id(), TestHarness::charge_mode())
        .await
        .unwrap();
    assert!(matches!(outcome, PaymentOutcome::Approved { .. }));
    assert_eq!(h.gateway.charge_attempts(), 2);
}

#[tokio::test]
async fn test_caller_cancellation_does_not_abort_in_flight_charge() {
    let h = TestHarness::new();
    h.gateway.set_charge_delay(Duration::from_millis(100));
    let order = h.finalized_order().await;

    // The caller gives up long before the gateway answers.
    let result = tokio::time::timeout(
        Duration::from_millis(10),
        h.payments.pay(order.id(), TestHarness::charge_mode()),
    )
    .await;
    assert!(result.is_err());

    // The detached charge completes and records its outcome anyway.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Paid);
    assert!(stored.gateway_reference().is_some());
    assert_eq!(h.notifier.count_of("PaymentConfirmed"), 1);
}

#[tokio::test]
async fn test_admin_cancel_during_charge_surfaces_settlement_conflict() {
    let h = TestHarness::new();
    h.gateway.set_charge_delay(Duration::from_millis(100));
    let order = h.finalized_order().await;

    let pay = {
        let payments = h.payments.clone();
        let order_id = order.id();
        tokio::spawn(async move { payments.pay(order_id, TestHarness::charge_mode()).await })
    };

    // An admin cancels while the charge is on the wire.
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.orders
        .apply_transition(
            order.id(),
            Version::first(),
            OrderTransition::Cancel {
                cancelled_by: "admin".to_string(),
                reason: "fraud review".to_string(),
            },
        )
        .await
        .unwrap();

    // The settled approval can no longer be recorded; the conflict is
    // surfaced for manual resolution instead of being guessed away.
    let result = pay.await.unwrap();
    assert!(matches!(
        result,
        Err(CheckoutError::SettlementConflict { .. })
    ));

    let stored = h.orders.get(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_cart_merge_survives_concurrent_checkout_shoppers() {
    let h = TestHarness::new();
    let customer_id = CustomerId::new();

    let add_p1 = {
        let carts = h.carts.clone();
        tokio::spawn(async move {
            carts
                .add_item(customer_id, ProductId::new("P1"), None, 1)
                .await
        })
    };
    let add_p2 = {
        let carts = h.carts.clone();
        tokio::spawn(async move {
            carts
                .add_item(customer_id, ProductId::new("P2"), None, 1)
                .await
        })
    };

    add_p1.await.unwrap().unwrap();
    add_p2.await.unwrap().unwrap();

    let cart = h.carts.get(customer_id).await;
    assert_eq!(cart.line_count(), 2);
}

#[tokio::test]
async fn test_out_of_stock_blocks_finalize_entirely() {
    let h = TestHarness::new();
    let customer_id = CustomerId::new();

    h.carts
        .add_item(customer_id, ProductId::new("P1"), None, 2)
        .await
        .unwrap();
    h.carts
        .add_item(customer_id, ProductId::new("P2"), None, 1)
        .await
        .unwrap();
    h.catalog.set_stock("P2", None, 0);

    let result = h
        .finalizer
        .finalize(
            customer_id,
            Some(TestHarness::address()),
            OrderCharges::default(),
        )
        .await;

    assert!(matches!(result, Err(CheckoutError::OutOfStock { .. })));
    assert_eq!(h.orders.order_count().await, 0);
}
