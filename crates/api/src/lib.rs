//! HTTP API server for the cart, checkout and payment core.
//!
//! Exposes the REST surface consumed by the storefront, mobile app and
//! admin panel, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{
    CartService, CheckoutFinalizer, InMemoryCatalog, LogNotifier, NotificationDispatcher,
    OrderAdminService, PaymentProcessor,
};
use gateway::PaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{CartStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static, G: PaymentGateway + 'static>(
    state: Arc<AppState<S, G>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/orders/cart",
            get(routes::cart::get_cart::<S, G>).put(routes::cart::replace_cart::<S, G>),
        )
        .route(
            "/api/orders/cart/items",
            post(routes::cart::add_item::<S, G>)
                .put(routes::cart::update_item::<S, G>)
                .delete(routes::cart::remove_item::<S, G>),
        )
        .route(
            "/api/orders/cart/addresses",
            post(routes::cart::attach_address::<S, G>),
        )
        .route("/api/orders", post(routes::orders::finalize::<S, G>))
        .route("/api/orders/user", get(routes::orders::list_user::<S, G>))
        .route("/api/orders/{id}", get(routes::orders::get::<S, G>))
        .route(
            "/api/orders/{id}/cancel",
            post(routes::orders::cancel::<S, G>),
        )
        .route("/api/orders/{id}/ship", post(routes::orders::ship::<S, G>))
        .route(
            "/api/orders/{id}/deliver",
            post(routes::orders::deliver::<S, G>),
        )
        .route(
            "/api/orders/{id}/reconcile",
            post(routes::payments::reconcile::<S, G>),
        )
        .route("/api/wompi/token", post(routes::payments::token::<S, G>))
        .route(
            "/api/wompi/payment3ds",
            post(routes::payments::payment3ds::<S, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state.
///
/// The catalog is an in-memory stand-in for the external catalog service
/// and is returned so callers (tests, demo setups) can seed it.
pub fn create_default_state<S: OrderStore + 'static, G: PaymentGateway + 'static>(
    order_store: S,
    gateway: G,
    currency: impl Into<String>,
) -> (Arc<AppState<S, G>>, InMemoryCatalog) {
    let cart_store = CartStore::new();
    let orders = Arc::new(order_store);
    let gateway = Arc::new(gateway);
    let catalog = InMemoryCatalog::new();
    let dispatcher = NotificationDispatcher::new(Arc::new(LogNotifier));

    let carts = CartService::new(cart_store.clone(), Arc::new(catalog.clone()));
    let finalizer = CheckoutFinalizer::new(
        cart_store,
        orders.clone(),
        Arc::new(catalog.clone()),
        dispatcher.clone(),
    );
    let payments = PaymentProcessor::new(
        orders.clone(),
        gateway.clone(),
        dispatcher.clone(),
        currency,
    );
    let admin = OrderAdminService::new(orders.clone(), dispatcher);

    let state = Arc::new(AppState {
        carts,
        finalizer,
        payments,
        admin,
        orders,
        gateway,
    });

    (state, catalog)
}
