use std::net::SocketAddr;

use crate::model::BookingStatus;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: slot-generation queries served.
pub const SLOT_QUERIES_TOTAL: &str = "hourbank_slot_queries_total";

/// Histogram: slot-generation latency in seconds.
pub const SLOT_QUERY_DURATION_SECONDS: &str = "hourbank_slot_query_duration_seconds";

/// Counter: bookings created.
pub const BOOKINGS_CREATED_TOTAL: &str = "hourbank_bookings_created_total";

/// Counter: booking creations rejected because the interval was taken.
pub const BOOKING_CONFLICTS_TOTAL: &str = "hourbank_booking_conflicts_total";

/// Counter: successful status transitions. Labels: to.
pub const STATUS_TRANSITIONS_TOTAL: &str = "hourbank_status_transitions_total";

/// Counter: rejected status transitions.
pub const INVALID_TRANSITIONS_TOTAL: &str = "hourbank_invalid_transitions_total";

// ── Settlement metrics ──────────────────────────────────────────

/// Counter: balance writes retried after a version conflict.
pub const BALANCE_RETRIES_TOTAL: &str = "hourbank_balance_retries_total";

/// Counter: settlements where the status update and the balance transfer
/// diverged. Any non-zero value needs operator attention.
pub const SETTLEMENT_FAILURES_TOTAL: &str = "hourbank_settlement_failures_total";

/// Install the global fmt tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a status variant to a short label for metrics.
pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pending",
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::InProgress => "in_progress",
        BookingStatus::Completed => "completed",
        BookingStatus::CancelledByConsumer => "cancelled_by_consumer",
        BookingStatus::CancelledByProvider => "cancelled_by_provider",
        BookingStatus::NoShowConsumer => "no_show_consumer",
        BookingStatus::NoShowProvider => "no_show_provider",
    }
}
