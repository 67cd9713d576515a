//! Order endpoints: finalize, detail, history, admin transitions.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{OrderId, Version};
use domain::{Order, OrderCharges, ShippingAddress};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::OrderStore;

use crate::auth::CustomerIdentity;
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct FinalizeRequest {
    /// Used when no address was attached to the cart beforehand.
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    /// Shipping/tax/discount are computed upstream and passed through.
    #[serde(default)]
    pub shipping_cents: i64,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

#[derive(Deserialize)]
pub struct AdminTransitionRequest {
    /// Expected order version; mismatches are rejected with 409.
    pub version: i64,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub products: Vec<OrderLineResponse>,
    pub shipping_address: ShippingAddress,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    /// Legacy display field; always `total_cents / 100`.
    pub total: f64,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn order_to_response(order: &Order) -> OrderResponse {
    let charges = order.charges();
    OrderResponse {
        id: order.id().to_string(),
        customer_id: order.customer_id().to_string(),
        products: order
            .lines()
            .iter()
            .map(|line| OrderLineResponse {
                product_id: line.product_id.to_string(),
                variant: line.variant.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal.cents(),
            })
            .collect(),
        shipping_address: order.shipping_address().clone(),
        shipping_cents: charges.shipping.cents(),
        tax_cents: charges.tax.cents(),
        discount_cents: charges.discount.cents(),
        total_cents: order.total().cents(),
        total: order.total().as_decimal(),
        status: order.status().as_str().to_string(),
        gateway_reference: order.gateway_reference().map(String::from),
        version: order.version().as_i64(),
        created_at: order.created_at().to_rfc3339(),
        updated_at: order.updated_at().to_rfc3339(),
    }
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

// -- Handlers --

/// POST /api/orders — finalize checkout into a `pending_payment` order.
#[tracing::instrument(skip(state, req))]
pub async fn finalize<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
    Json(req): Json<FinalizeRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let charges = OrderCharges::from_cents(req.shipping_cents, req.tax_cents, req.discount_cents);

    let order = state
        .finalizer
        .finalize(customer_id, req.shipping_address, charges)
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(order_to_response(&order)),
    ))
}

/// GET /api/orders/:id — order detail.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .get(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order_to_response(&order)))
}

/// GET /api/orders/user — orders of the authenticated customer.
#[tracing::instrument(skip(state))]
pub async fn list_user<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_for_customer(customer_id).await?;
    Ok(Json(orders.iter().map(order_to_response).collect()))
}

/// POST /api/orders/:id/cancel — admin cancel of a pending order.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
    Json(req): Json<AdminTransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .admin
        .cancel(
            order_id,
            Version::new(req.version),
            req.actor.unwrap_or_else(|| "admin".to_string()),
            req.reason.unwrap_or_else(|| "cancelled by admin".to_string()),
        )
        .await?;
    Ok(Json(order_to_response(&order)))
}

/// POST /api/orders/:id/ship — admin marks a paid order shipped.
#[tracing::instrument(skip(state, req))]
pub async fn ship<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
    Json(req): Json<AdminTransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .admin
        .ship(
            order_id,
            Version::new(req.version),
            req.actor.unwrap_or_else(|| "admin".to_string()),
        )
        .await?;
    Ok(Json(order_to_response(&order)))
}

/// POST /api/orders/:id/deliver — admin marks a shipped order delivered.
#[tracing::instrument(skip(state, req))]
pub async fn deliver<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
    Json(req): Json<AdminTransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .admin
        .deliver(
            order_id,
            Version::new(req.version),
            req.actor.unwrap_or_else(|| "admin".to_string()),
        )
        .await?;
    Ok(Json(order_to_response(&order)))
}
