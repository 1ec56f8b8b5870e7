//! HTTP surface for the short-stay booking backend.
//!
//! REST endpoints for availability search, booking creation with and
//! without payment, and payment-intent management, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use providers::{
    BookingApi, DisabledNotifier, NotificationSink, PaymentGateway, ResHarmonicsClient,
    StripeGateway, WebhookNotifier,
};
use saga::{AvailabilitySearch, BookingSaga};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
use routes::booking::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/availability/search", get(routes::availability::search))
        .route(
            "/availability/buildings",
            get(routes::availability::buildings),
        )
        .route("/booking/create", post(routes::booking::create))
        .route(
            "/booking/create-with-payment",
            post(routes::booking::create_with_payment),
        )
        .route("/booking/{id}", get(routes::booking::get))
        .route("/booking/{id}/payments", get(routes::booking::payments))
        .route("/payment/create-intent", post(routes::payment::create_intent))
        .route("/payment/verify", post(routes::payment::verify))
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

/// Builds application state from trait objects, shared between the live
/// wiring and tests.
pub fn create_state(
    booking_api: Arc<dyn BookingApi>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    config: &Config,
) -> Arc<AppState> {
    let saga = BookingSaga::new(
        Arc::clone(&booking_api),
        Arc::clone(&gateway),
        notifier,
        config.defaults,
    );
    let availability = AvailabilitySearch::new(Arc::clone(&booking_api), config.rate_codes.clone());
    Arc::new(AppState {
        saga,
        availability,
        booking_api,
        gateway,
    })
}

/// Wires the live provider clients from configuration.
pub fn create_live_state(
    config: &Config,
) -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let booking_api: Arc<dyn BookingApi> =
        Arc::new(ResHarmonicsClient::new(config.booking_provider())?);
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(config.stripe())?);
    let notifier: Arc<dyn NotificationSink> = match config.webhook() {
        Some(webhook) => Arc::new(WebhookNotifier::new(webhook)?),
        None => Arc::new(DisabledNotifier),
    };
    Ok(create_state(booking_api, gateway, notifier, config))
}
