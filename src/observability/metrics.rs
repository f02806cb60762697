//! Proxy metrics.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): inbound requests by kind (`plain`, `websocket`)
//! - `proxy_upstream_errors_total` (counter): plain forwarding failures
//! - `proxy_tunnels_opened_total` (counter): tunnels that reached relaying
//! - `proxy_tunnel_failures_total` (counter): aborted tunnels by stage (`dial`, `upgrade`)
//! - `proxy_relay_messages_total` (counter): relayed messages by direction and type

use crate::websocket::frame::FrameKind;
use crate::websocket::relay::Direction;

/// Record an inbound request.
pub fn record_request(kind: &'static str) {
    metrics::counter!("proxy_requests_total", "kind" => kind).increment(1);
}

/// Record a failed plain forward.
pub fn record_upstream_error() {
    metrics::counter!("proxy_upstream_errors_total").increment(1);
}

pub fn record_tunnel_opened() {
    metrics::counter!("proxy_tunnels_opened_total").increment(1);
}

/// Record a tunnel that failed before relaying.
pub fn record_tunnel_failure(stage: &'static str) {
    metrics::counter!("proxy_tunnel_failures_total", "stage" => stage).increment(1);
}

pub fn record_relayed_message(direction: Direction, kind: FrameKind) {
    metrics::counter!(
        "proxy_relay_messages_total",
        "direction" => direction.as_str(),
        "kind" => kind.as_str()
    )
    .increment(1);
}
