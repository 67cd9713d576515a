//! Gateway-facing payment endpoints.
//!
//! Server-side only; the mobile/storefront clients never talk to the
//! gateway directly.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::PaymentOutcome;
use gateway::{BrowserInfo, ChargeMode, DirectCharge, PaymentGateway, ThreeDsCharge};
use serde::{Deserialize, Serialize};
use store::OrderStore;

use crate::error::ApiError;
use crate::routes::AppState;
use crate::routes::orders::parse_order_id;

// -- Request types --

#[derive(Deserialize)]
pub struct Payment3dsRequest {
    /// Accepted for wire compatibility with older clients. The processor
    /// acquires its own token per attempt, so a stale client token can't
    /// expire mid-3DS-redirect.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "formData")]
    pub form_data: PaymentFormData,
}

#[derive(Deserialize)]
pub struct PaymentFormData {
    pub order_id: String,
    pub card_token: String,
    pub customer_email: String,
    #[serde(default = "default_installments")]
    pub installments: u32,
    /// Present when the issuer requires a 3DS challenge.
    #[serde(default)]
    pub three_ds: Option<ThreeDsFields>,
}

fn default_installments() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct ThreeDsFields {
    pub return_url: String,
    pub user_agent: String,
    pub accept_header: String,
    pub language: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub order_id: String,
    pub status: String,
    pub approved: bool,
    /// True when the outcome awaits reconciliation; not an error.
    pub pending_confirmation: bool,
    pub gateway_reference: Option<String>,
    pub reason: Option<String>,
}

fn outcome_to_response(outcome: PaymentOutcome) -> PaymentResponse {
    match outcome {
        PaymentOutcome::Approved { order } => PaymentResponse {
            order_id: order.id().to_string(),
            status: order.status().as_str().to_string(),
            approved: true,
            pending_confirmation: false,
            gateway_reference: order.gateway_reference().map(String::from),
            reason: None,
        },
        PaymentOutcome::Rejected { order, reason } => PaymentResponse {
            order_id: order.id().to_string(),
            status: order.status().as_str().to_string(),
            approved: false,
            pending_confirmation: false,
            gateway_reference: order.gateway_reference().map(String::from),
            reason: Some(reason),
        },
        PaymentOutcome::PendingConfirmation { order_id } => PaymentResponse {
            order_id: order_id.to_string(),
            status: "pending_payment".to_string(),
            approved: false,
            pending_confirmation: true,
            gateway_reference: None,
            reason: None,
        },
    }
}

// -- Handlers --

/// POST /api/wompi/token — acquire a gateway bearer token.
#[tracing::instrument(skip(state))]
pub async fn token<S: OrderStore, G: PaymentGateway>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.gateway.request_token().await?;
    Ok(Json(TokenResponse {
        access_token: token.token,
        expires_in: token.expires_in,
    }))
}

/// POST /api/wompi/payment3ds — submit a tokenized charge for an order.
#[tracing::instrument(skip(state, req))]
pub async fn payment3ds<S: OrderStore + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<Payment3dsRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let form = req.form_data;
    let order_id = parse_order_id(&form.order_id)?;

    let mode = match form.three_ds {
        Some(fields) => ChargeMode::ThreeDs(ThreeDsCharge {
            card_token: form.card_token,
            installments: form.installments,
            customer_email: form.customer_email,
            return_url: fields.return_url,
            browser: BrowserInfo {
                user_agent: fields.user_agent,
                accept_header: fields.accept_header,
                language: fields.language,
                screen_width: fields.screen_width,
                screen_height: fields.screen_height,
            },
        }),
        None => ChargeMode::Direct(DirectCharge {
            card_token: form.card_token,
            installments: form.installments,
            customer_email: form.customer_email,
        }),
    };

    let outcome = state.payments.pay(order_id, mode).await?;
    Ok(Json(outcome_to_response(outcome)))
}

/// POST /api/orders/:id/reconcile — resolve an ambiguous charge.
#[tracing::instrument(skip(state))]
pub async fn reconcile<S: OrderStore + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let outcome = state.payments.reconcile(order_id).await?;
    Ok(Json(outcome_to_response(outcome)))
}
