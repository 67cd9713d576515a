//! API server entry point.

use api::config::Config;
use gateway::HttpPaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: OrderStore + 'static>(
    order_store: S,
    gateway: HttpPaymentGateway,
    config: Config,
    metrics_handle: PrometheusHandle,
) {
    let (state, _catalog) =
        api::create_default_state(order_store, gateway, config.gateway.currency.clone());
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Configuration and gateway client, built once
    let config = Config::from_env();
    let gateway = HttpPaymentGateway::new(config.gateway.clone())
        .expect("failed to build gateway client");

    // 4. Order store: PostgreSQL when configured, in-memory otherwise
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");

            let store = PostgresOrderStore::new(pool);
            store.run_migrations().await.expect("migrations failed");

            serve(store, gateway, config, metrics_handle).await;
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory order store");
            serve(InMemoryOrderStore::new(), gateway, config, metrics_handle).await;
        }
    }
}
