// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Recording goes through the metrics-rs facade; without an installed
//! recorder every call is a no-op, which is what tests rely on.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Switchboard metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "switchboard_route_decisions_total",
        "Routing decisions by event shape and resulting action"
    );
    describe_counter!(
        "switchboard_ledger_events_total",
        "Status events applied to the ledger by record kind and outcome"
    );
    describe_counter!(
        "switchboard_notifications_dropped_total",
        "Live notifications dropped because a subscriber lagged"
    );
    describe_counter!(
        "switchboard_carrier_requests_total",
        "Carrier API requests by operation and result"
    );
    describe_counter!(
        "switchboard_webhook_rejections_total",
        "Carrier webhooks rejected for an invalid signature"
    );
    describe_gauge!(
        "switchboard_live_sessions",
        "Currently connected live-update sockets"
    );
    describe_histogram!(
        "switchboard_webhook_latency_seconds",
        "Time spent answering carrier webhooks"
    );
}

/// Record a routing decision, e.g. `("inbound", "dial_client")`.
pub fn record_route_decision(event: &'static str, action: &'static str) {
    metrics::counter!("switchboard_route_decisions_total", "event" => event, "action" => action)
        .increment(1);
}

/// Record the outcome of a ledger write (`inserted`, `stale`, ...).
pub fn record_ledger_outcome(kind: &'static str, outcome: &'static str) {
    metrics::counter!("switchboard_ledger_events_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}

/// Record notifications a lagging subscriber missed.
pub fn record_notifications_dropped(count: u64) {
    metrics::counter!("switchboard_notifications_dropped_total").increment(count);
}

/// Record a carrier API request result.
pub fn record_carrier_request(operation: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("switchboard_carrier_requests_total", "operation" => operation, "result" => result)
        .increment(1);
}

/// Record a webhook rejected by signature validation.
pub fn record_webhook_rejection() {
    metrics::counter!("switchboard_webhook_rejections_total").increment(1);
}

/// Adjust the number of connected live sockets.
pub fn adjust_live_sessions(delta: f64) {
    metrics::gauge!("switchboard_live_sessions").increment(delta);
}

/// Record webhook handling latency.
pub fn record_webhook_latency(route: &'static str, seconds: f64) {
    metrics::histogram!("switchboard_webhook_latency_seconds", "route" => route).record(seconds);
}
