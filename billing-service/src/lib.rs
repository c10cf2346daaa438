pub mod billing;
pub mod config;
pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post, put},
    Router,
};
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use billing::{InvoiceLifecycle, PaymentReconciler};
use handlers::{health, invoices, payments};
use services::BillingStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BillingStore>,
    pub lifecycle: Arc<InvoiceLifecycle>,
    pub reconciler: Arc<PaymentReconciler>,
}

/// Build the HTTP router for the billing service.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route(
            "/rooms/:room_id/invoice-preview",
            get(invoices::invoice_preview),
        )
        .route("/rooms/:room_id/invoice", post(invoices::create_invoice))
        .route("/rooms/:room_id/invoices", get(invoices::list_room_invoices))
        .route(
            "/invoices/:invoice_id",
            get(invoices::get_invoice).put(invoices::edit_invoice),
        )
        .route(
            "/invoices/:invoice_id/status",
            put(invoices::mark_invoice_status),
        )
        .route(
            "/invoices/:invoice_id/payments",
            post(payments::submit_payment),
        )
        .route(
            "/invoices/:invoice_id/gateway-callback",
            post(payments::gateway_callback),
        )
        .route(
            "/payments/:payment_id/confirm",
            post(payments::confirm_payment),
        )
        .route(
            "/payments/unconfirmed",
            get(payments::list_unconfirmed_payments),
        )
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
