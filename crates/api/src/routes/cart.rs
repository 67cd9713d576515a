//! Cart endpoints: read, replace, line-item mutations, address.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{Cart, CartItem, ProductId, ShippingAddress};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::OrderStore;

use crate::auth::CustomerIdentity;
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant: Option<String>,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant: Option<String>,
    /// Zero or negative removes the line.
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Deserialize)]
pub struct ReplaceCartRequest {
    pub items: Vec<AddItemRequest>,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub variant: Option<String>,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub subtotal_cents: i64,
    pub shipping_address: Option<ShippingAddress>,
}

fn cart_to_response(cart: &Cart) -> CartResponse {
    CartResponse {
        items: cart
            .items()
            .iter()
            .map(|item: &CartItem| CartItemResponse {
                product_id: item.product_id.to_string(),
                variant: item.variant.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                subtotal_cents: item.subtotal().cents(),
            })
            .collect(),
        subtotal_cents: cart.subtotal().cents(),
        shipping_address: cart.shipping_address().cloned(),
    }
}

// -- Handlers --

/// GET /api/orders/cart — read the active cart.
pub async fn get_cart<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get(customer_id).await;
    Ok(Json(cart_to_response(&cart)))
}

/// PUT /api/orders/cart — replace the active cart's lines.
pub async fn replace_cart<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
    Json(req): Json<ReplaceCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let lines = req
        .items
        .into_iter()
        .map(|item| (ProductId::new(item.product_id), item.variant, item.quantity))
        .collect();

    let cart = state.carts.replace(customer_id, lines).await?;
    Ok(Json(cart_to_response(&cart)))
}

/// POST /api/orders/cart/items — add a line (merging duplicates).
pub async fn add_item<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .add_item(
            customer_id,
            ProductId::new(req.product_id),
            req.variant,
            req.quantity,
        )
        .await?;
    Ok(Json(cart_to_response(&cart)))
}

/// PUT /api/orders/cart/items — set a line's quantity (≤ 0 removes).
pub async fn update_item<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .update_quantity(
            customer_id,
            ProductId::new(req.product_id),
            req.variant,
            req.quantity,
        )
        .await?;
    Ok(Json(cart_to_response(&cart)))
}

/// DELETE /api/orders/cart/items — remove a line.
pub async fn remove_item<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
    Json(req): Json<RemoveItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_item(customer_id, ProductId::new(req.product_id), req.variant)
        .await?;
    Ok(Json(cart_to_response(&cart)))
}

/// POST /api/orders/cart/addresses — attach the shipping address.
pub async fn attach_address<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
    CustomerIdentity(customer_id): CustomerIdentity,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.attach_address(customer_id, address).await?;
    Ok(Json(cart_to_response(&cart)))
}
