use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static INVOICES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PAYMENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static INVOICE_EMAILS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static DB_QUERY_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Install the recorder and register the custom billing metrics. Safe to call
/// more than once (tests build the app repeatedly in one process).
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        if let Ok(handle) = PrometheusBuilder::new().install_recorder() {
            METRICS_HANDLE.set(handle).ok();
        }
    }

    if PROMETHEUS_REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let invoices_counter = IntCounterVec::new(
        Opts::new("billing_invoices_total", "Invoices created by status"),
        &["status"],
    )
    .expect("Failed to create billing_invoices_total metric");

    let payments_counter = IntCounterVec::new(
        Opts::new("billing_payments_total", "Payment submissions by method"),
        &["method"],
    )
    .expect("Failed to create billing_payments_total metric");

    let emails_counter = IntCounterVec::new(
        Opts::new(
            "billing_invoice_emails_total",
            "Invoice notification attempts by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create billing_invoice_emails_total metric");

    let db_duration = HistogramVec::new(
        HistogramOpts::new(
            "billing_db_query_duration_seconds",
            "Database query duration by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create billing_db_query_duration_seconds metric");

    registry
        .register(Box::new(invoices_counter.clone()))
        .expect("Failed to register billing_invoices_total");
    registry
        .register(Box::new(payments_counter.clone()))
        .expect("Failed to register billing_payments_total");
    registry
        .register(Box::new(emails_counter.clone()))
        .expect("Failed to register billing_invoice_emails_total");
    registry
        .register(Box::new(db_duration.clone()))
        .expect("Failed to register billing_db_query_duration_seconds");

    PROMETHEUS_REGISTRY.set(registry).ok();
    INVOICES_TOTAL.set(invoices_counter).ok();
    PAYMENTS_TOTAL.set(payments_counter).ok();
    INVOICE_EMAILS_TOTAL.set(emails_counter).ok();
    DB_QUERY_DURATION.set(db_duration).ok();
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record an invoice creation or status change.
pub fn record_invoice(status: &str) {
    if let Some(counter) = INVOICES_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record a payment submission or confirmation.
pub fn record_payment(method: &str) {
    if let Some(counter) = PAYMENTS_TOTAL.get() {
        counter.with_label_values(&[method]).inc();
    }
}

/// Record an invoice email attempt outcome.
pub fn record_notification(outcome: &str) {
    if let Some(counter) = INVOICE_EMAILS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Time a database operation; drop the returned timer to observe.
pub fn db_timer(operation: &str) -> Option<prometheus::HistogramTimer> {
    DB_QUERY_DURATION
        .get()
        .map(|histogram| histogram.with_label_values(&[operation]).start_timer())
}
