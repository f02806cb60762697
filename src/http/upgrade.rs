//! WebSocket upgrade detection.

use axum::http::{header, HeaderMap, HeaderName};

/// Returns true if the request asks to switch to the WebSocket protocol.
///
/// Requires an `Upgrade` header carrying the `websocket` token and a
/// `Connection` header carrying the `upgrade` token. Both headers are token
/// lists and may appear more than once; matching is case-insensitive.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    has_token(headers, &header::CONNECTION, "upgrade")
        && has_token(headers, &header::UPGRADE, "websocket")
}

fn has_token(headers: &HeaderMap, name: &HeaderName, token: &str) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|candidate| candidate.trim().eq_ignore_ascii_case(token))
}
