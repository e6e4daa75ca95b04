//! HTTP API server for the shopping backend.
//!
//! Wires the order, payment, and inventory services onto one in-memory
//! event channel and exposes their REST surface, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use common::{CoreError, TOPIC_ORDER_LIFECYCLE, TOPIC_PAYMENT_STATUS};
use event_bus::InMemoryEventBus;
use inventory::{InventoryService, InventoryStore, PaidOrderHandler};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{OrderService, OrderStore, PaymentStatusHandler};
use payments::{DrawSource, OrderLifecycleHandler, PaymentService, PaymentStore, UniformDraws};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub inventory: Arc<InventoryService>,
    /// Kept on the state so tests can flush in-flight events.
    pub bus: InMemoryEventBus,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}", delete(routes::orders::delete))
        .route("/orders/{id}/items", put(routes::orders::update_items))
        .route("/orders/{id}/cancel", put(routes::orders::cancel))
        .route("/payments", post(routes::payments::create))
        .route("/payments/{id}", get(routes::payments::get))
        .route("/payments/{id}", put(routes::payments::update))
        .route("/items", get(routes::items::list))
        .route("/items", post(routes::items::create))
        .route("/items/{catalog_id}", get(routes::items::get))
        .route("/items/{catalog_id}", put(routes::items::update))
        .route("/items/{catalog_id}", delete(routes::items::delete))
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

/// Builds the services, wires every consumer onto the event channel,
/// and returns the shared state. The draw source is injectable so
/// tests can force payment outcomes.
pub async fn create_state(
    config: &Config,
    draws: Arc<dyn DrawSource>,
) -> Result<Arc<AppState>, CoreError> {
    let bus = InMemoryEventBus::new(config.bus_partitions, config.retry_policy());

    let orders = Arc::new(OrderService::new(
        OrderStore::new(),
        Arc::new(bus.clone()),
    ));
    let payments = Arc::new(PaymentService::new(
        PaymentStore::new(),
        Arc::new(bus.clone()),
        config.outcome_policy()?,
        draws,
    ));
    let inventory = Arc::new(InventoryService::new(InventoryStore::new()));

    bus.subscribe(
        TOPIC_PAYMENT_STATUS,
        Arc::new(PaymentStatusHandler::new(orders.clone())),
    )
    .await;
    bus.subscribe(
        TOPIC_ORDER_LIFECYCLE,
        Arc::new(OrderLifecycleHandler::new(payments.clone())),
    )
    .await;
    bus.subscribe(
        TOPIC_ORDER_LIFECYCLE,
        Arc::new(PaidOrderHandler::new(inventory.clone())),
    )
    .await;

    Ok(Arc::new(AppState {
        orders,
        payments,
        inventory,
        bus,
    }))
}

/// [`create_state`] with the production (random) draw source.
pub async fn create_default_state(config: &Config) -> Result<Arc<AppState>, CoreError> {
    create_state(config, Arc::new(UniformDraws)).await
}
