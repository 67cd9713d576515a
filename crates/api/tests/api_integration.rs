//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::InMemoryCatalog;
use domain::Money;
use gateway::InMemoryPaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryOrderStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, InMemoryCatalog, InMemoryPaymentGateway) {
    let store = InMemoryOrderStore::new();
    let gateway = InMemoryPaymentGateway::new();
    let (state, catalog) = api::create_default_state(store, gateway.clone(), "COP");
    catalog.set_product("P1", None, Money::from_cents(1999), 100);

    let app = api::create_app(state, get_metrics_handle());
    (app, catalog, gateway)
}

fn customer() -> String {
    uuid::Uuid::new_v4().to_string()
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    customer_id: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = customer_id {
        builder = builder.header("x-customer-id", id);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

fn address_json() -> serde_json::Value {
    serde_json::json!({
        "recipient": "Ana Torres",
        "line1": "Calle 10 # 5-21",
        "city": "Bogotá",
        "region": "Cundinamarca",
        "postal_code": "110111",
        "country": "CO"
    })
}

/// Drives a customer to a finalized order and returns its ID.
async fn finalized_order(app: &axum::Router, customer_id: &str) -> serde_json::Value {
    send(
        app,
        "POST",
        "/api/orders/cart/items",
        Some(customer_id),
        Some(serde_json::json!({"product_id": "P1", "quantity": 2})),
    )
    .await;

    let (status, order) = send(
        app,
        "POST",
        "/api/orders",
        Some(customer_id),
        Some(serde_json::json!({
            "shipping_address": address_json(),
            "shipping_cents": 500
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    order
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup();
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_cart_requires_identity() {
    let (app, _, _) = setup();
    let (status, _) = send(&app, "GET", "/api/orders/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_add_and_read() {
    let (app, _, _) = setup();
    let customer_id = customer();

    let (status, cart) = send(
        &app,
        "POST",
        "/api/orders/cart/items",
        Some(&customer_id),
        Some(serde_json::json!({"product_id": "P1", "quantity": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["unit_price_cents"], 1999);
    assert_eq!(cart["subtotal_cents"], 3998);

    let (status, cart) = send(&app, "GET", "/api/orders/cart", Some(&customer_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cart_unknown_product_rejected() {
    let (app, _, _) = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/api/orders/cart/items",
        Some(&customer()),
        Some(serde_json::json!({"product_id": "NOPE", "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_quantity_to_zero_removes_line() {
    let (app, _, _) = setup();
    let customer_id = customer();

    send(
        &app,
        "POST",
        "/api/orders/cart/items",
        Some(&customer_id),
        Some(serde_json::json!({"product_id": "P1", "quantity": 2})),
    )
    .await;

    let (status, cart) = send(
        &app,
        "PUT",
        "/api/orders/cart/items",
        Some(&customer_id),
        Some(serde_json::json!({"product_id": "P1", "quantity": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_finalize_computes_frozen_total() {
    let (app, _, _) = setup();
    let customer_id = customer();

    let order = finalized_order(&app, &customer_id).await;

    assert_eq!(order["status"], "pending_payment");
    assert_eq!(order["total_cents"], 4498);
    // Legacy float display field mirrors the cents.
    assert_eq!(order["total"], 44.98);
    assert_eq!(order["version"], 1);
    assert_eq!(order["products"][0]["subtotal_cents"], 3998);

    // The active cart is gone.
    let (_, cart) = send(&app, "GET", "/api/orders/cart", Some(&customer_id), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_finalize_empty_cart_rejected() {
    let (app, _, _) = setup();
    let (status, json) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&customer()),
        Some(serde_json::json!({"shipping_address": address_json()})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_payment3ds_approves_and_rejects_duplicates() {
    let (app, _, gateway) = setup();
    let customer_id = customer();
    let order = finalized_order(&app, &customer_id).await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let body = serde_json::json!({
        "token": "client-supplied-token-ignored",
        "formData": {
            "order_id": order_id,
            "card_token": "tok_test_123",
            "customer_email": "ana@example.com"
        }
    });

    let (status, payment) = send(
        &app,
        "POST",
        "/api/wompi/payment3ds",
        Some(&customer_id),
        Some(body.clone()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "pagado");
    assert_eq!(payment["approved"], true);
    assert!(payment["gateway_reference"].as_str().is_some());

    // Double-tap: rejected locally, the gateway sees exactly one charge.
    let (status, _) = send(
        &app,
        "POST",
        "/api/wompi/payment3ds",
        Some(&customer_id),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(gateway.charge_attempts(), 1);

    // The order reflects the payment.
    let (_, fetched) = send(
        &app,
        "GET",
        &format!("/api/orders/{}", order["id"].as_str().unwrap()),
        None,
        None,
    )
    .await;
    assert_eq!(fetched["status"], "pagado");
    assert_eq!(fetched["version"], 2);
}

#[tokio::test]
async fn test_rejected_payment_marks_order_unpaid() {
    let (app, _, gateway) = setup();
    gateway.set_decline("fondos insuficientes");

    let customer_id = customer();
    let order = finalized_order(&app, &customer_id).await;

    let (status, payment) = send(
        &app,
        "POST",
        "/api/wompi/payment3ds",
        Some(&customer_id),
        Some(serde_json::json!({
            "formData": {
                "order_id": order["id"],
                "card_token": "tok_test_123",
                "customer_email": "ana@example.com"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "no_pagado");
    assert_eq!(payment["approved"], false);
    assert_eq!(payment["reason"], "fondos insuficientes");
}

#[tokio::test]
async fn test_ambiguous_payment_surfaces_pending_confirmation() {
    let (app, _, gateway) = setup();
    gateway.set_timeout(false);
    gateway.set_lookup_unavailable(true);

    let customer_id = customer();
    let order = finalized_order(&app, &customer_id).await;

    let (status, payment) = send(
        &app,
        "POST",
        "/api/wompi/payment3ds",
        Some(&customer_id),
        Some(serde_json::json!({
            "formData": {
                "order_id": order["id"],
                "card_token": "tok_test_123",
                "customer_email": "ana@example.com"
            }
        })),
    )
    .await;

    // Pending confirmation is a result, not an error.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["pending_confirmation"], true);
    assert_eq!(payment["status"], "pending_payment");
}

#[tokio::test]
async fn test_admin_cancel_and_stale_version() {
    let (app, _, _) = setup();
    let customer_id = customer();
    let order = finalized_order(&app, &customer_id).await;
    let order_uri = format!("/api/orders/{}", order["id"].as_str().unwrap());

    // Stale version loses.
    let (status, _) = send(
        &app,
        "POST",
        &format!("{order_uri}/cancel"),
        None,
        Some(serde_json::json!({"version": 99, "reason": "test"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Current version wins.
    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("{order_uri}/cancel"),
        None,
        Some(serde_json::json!({"version": 1, "reason": "customer request"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelado");
    assert_eq!(cancelled["version"], 2);
}

#[tokio::test]
async fn test_ship_requires_paid_order() {
    let (app, _, _) = setup();
    let customer_id = customer();
    let order = finalized_order(&app, &customer_id).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/orders/{}/ship", order["id"].as_str().unwrap()),
        None,
        Some(serde_json::json!({"version": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_orders_for_customer() {
    let (app, _, _) = setup();
    let customer_id = customer();

    finalized_order(&app, &customer_id).await;

    let (status, orders) = send(&app, "GET", "/api/orders/user", Some(&customer_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    // Another customer sees nothing.
    let (_, orders) = send(&app, "GET", "/api/orders/user", Some(&customer()), None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_order_not_found() {
    let (app, _, _) = setup();
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/orders/{}", uuid::Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gateway_token_endpoint() {
    let (app, _, _) = setup();
    let (status, json) = send(&app, "POST", "/api/wompi/token", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["access_token"].as_str().is_some());
}
