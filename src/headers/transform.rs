//! Outgoing header computation.
//!
//! # Modes
//! - `Plain`: inbound headers plus every injected header, appended.
//! - `Upgrade`: as plain, but the client's handshake headers (the strip set)
//!   are removed first so they cannot collide with the fresh handshake the
//!   tunnel performs against the backend.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::headers::HeaderSet;

/// Handshake headers never forwarded on the upgrade path.
pub const STRIP_SET: [HeaderName; 5] = [
    header::UPGRADE,
    header::CONNECTION,
    header::SEC_WEBSOCKET_KEY,
    header::SEC_WEBSOCKET_VERSION,
    header::SEC_WEBSOCKET_EXTENSIONS,
];

/// Which request path the transform is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    /// Request is forwarded as-is to the backend.
    Plain,
    /// Request is re-issued as a new WebSocket handshake.
    Upgrade,
}

/// A single configured `(name, value)` pair to inject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedHeader {
    pub name: HeaderName,
    pub value: HeaderValue,
}

impl InjectedHeader {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }
}

/// Compute the header set sent to the backend.
///
/// The inbound map is never modified.
pub fn transform_headers(
    inbound: &HeaderMap,
    injected: &[InjectedHeader],
    mode: TransformMode,
) -> HeaderSet {
    let mut headers = HeaderSet::from_header_map(inbound);

    if mode == TransformMode::Upgrade {
        for name in &STRIP_SET {
            headers.remove(name);
        }
    }

    for header in injected {
        headers.add(header.name.clone(), header.value.clone());
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injected(pairs: &[(&'static str, &'static str)]) -> Vec<InjectedHeader> {
        pairs
            .iter()
            .map(|&(n, v)| InjectedHeader::new(HeaderName::from_static(n), HeaderValue::from_static(v)))
            .collect()
    }

    fn handshake_headers() -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("host", HeaderValue::from_static("localhost:8080"));
        map.insert("upgrade", HeaderValue::from_static("websocket"));
        map.insert("connection", HeaderValue::from_static("Upgrade"));
        map.insert("sec-websocket-key", HeaderValue::from_static("dGhlIHNhbXBsZSBub25jZQ=="));
        map.insert("sec-websocket-version", HeaderValue::from_static("13"));
        map.insert("sec-websocket-extensions", HeaderValue::from_static("permessage-deflate"));
        map.insert("x-user", HeaderValue::from_static("original"));
        map
    }

    #[test]
    fn plain_mode_appends_in_configured_order() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-user", HeaderValue::from_static("original"));
        inbound.insert("accept", HeaderValue::from_static("*/*"));

        let out = transform_headers(
            &inbound,
            &injected(&[("x-user", "injected"), ("x-role", "admin"), ("x-user", "second")]),
            TransformMode::Plain,
        );

        assert_eq!(out.len(), inbound.len() + 3);
        let users: Vec<_> = out.get_all(&HeaderName::from_static("x-user")).collect();
        assert_eq!(users, vec!["original", "injected", "second"]);
        assert_eq!(out.get(&header::ACCEPT).unwrap(), "*/*");
        assert_eq!(out.get(&HeaderName::from_static("x-role")).unwrap(), "admin");
    }

    #[test]
    fn plain_mode_keeps_handshake_headers() {
        let out = transform_headers(&handshake_headers(), &[], TransformMode::Plain);
        for name in &STRIP_SET {
            assert!(out.contains(name), "{name} should survive plain mode");
        }
    }

    #[test]
    fn upgrade_mode_strips_handshake_headers() {
        let out = transform_headers(
            &handshake_headers(),
            &injected(&[("x-user", "injected")]),
            TransformMode::Upgrade,
        );

        for name in &STRIP_SET {
            assert!(!out.contains(name), "{name} should be stripped");
        }
        assert_eq!(out.get(&header::HOST).unwrap(), "localhost:8080");
        let users: Vec<_> = out.get_all(&HeaderName::from_static("x-user")).collect();
        assert_eq!(users, vec!["original", "injected"]);
    }

    #[test]
    fn upgrade_mode_does_not_strip_injected_headers() {
        // An operator may deliberately inject a strip-set name; injection runs last.
        let out = transform_headers(
            &handshake_headers(),
            &injected(&[("connection", "close")]),
            TransformMode::Upgrade,
        );
        let values: Vec<_> = out.get_all(&header::CONNECTION).collect();
        assert_eq!(values, vec!["close"]);
    }

    #[test]
    fn inbound_map_is_untouched() {
        let inbound = handshake_headers();
        let before = inbound.clone();
        let _ = transform_headers(&inbound, &injected(&[("x-a", "1")]), TransformMode::Upgrade);
        assert_eq!(inbound, before);
    }
}
