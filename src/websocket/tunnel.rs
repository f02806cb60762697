//! WebSocket tunnel lifecycle.
//!
//! # State Machine
//! ```text
//! Start → DialingBackend → UpgradingClient → Relaying → Closed
//!              │                 │
//!              └──────┬──────────┘
//!                     ▼
//!                   Failed
//! ```
//!
//! The backend is dialed first, with a freshly generated handshake carrying
//! the transformed client headers. Only once the backend accepted is the
//! client switched to WebSocket, so a client never ends up upgraded with
//! nothing behind it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::FromRequestParts;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::Instrument;
use url::Url;

use crate::config::ProxyConfig;
use crate::headers::{transform_headers, HeaderSet, TransformMode};
use crate::observability::metrics;
use crate::websocket::relay::{relay_messages, Direction, RelayOutcome};

/// Body sent when the backend handshake fails.
pub const DIAL_FAILED_BODY: &str = "error opening websocket connection";

/// Body sent when the client handshake cannot be completed.
pub const UPGRADE_FAILED_BODY: &str = "error upgrading websocket connection";

/// Backend side of a tunnel.
pub type BackendSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

static TUNNEL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a tunnel, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TunnelId(u64);

impl TunnelId {
    pub fn new() -> Self {
        Self(TUNNEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TunnelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TunnelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tunnel-{}", self.0)
    }
}

/// Tunnel lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    Start,
    DialingBackend,
    UpgradingClient,
    Relaying,
    Closed,
    Failed,
}

/// Errors that abort a tunnel before relaying starts.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("backend handshake failed: {0}")]
    Dial(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("client handshake rejected: {0}")]
    Upgrade(#[from] axum::extract::ws::rejection::WebSocketUpgradeRejection),
}

impl TunnelError {
    fn stage(&self) -> &'static str {
        match self {
            TunnelError::Dial(_) => "dial",
            TunnelError::Upgrade(_) => "upgrade",
        }
    }
}

/// Establishes WebSocket tunnels to the configured backend.
#[derive(Debug, Clone)]
pub struct WebSocketTunnel {
    config: Arc<ProxyConfig>,
}

impl WebSocketTunnel {
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        Self { config }
    }

    /// URL dialed for every tunnel.
    pub fn backend_url(&self) -> &Url {
        &self.config.backend.websocket_url
    }

    /// Run the handshake sequence for one upgrade request.
    ///
    /// Returns the response for the client: a 101 that hands the connection
    /// to the relay tasks, or a 500 if either handshake fails.
    pub async fn open(&self, request: Request<Body>) -> Response {
        let id = TunnelId::new();
        let span = tracing::info_span!("tunnel", id = %id);
        self.open_inner(id, request).instrument(span).await
    }

    async fn open_inner(&self, id: TunnelId, request: Request<Body>) -> Response {
        let (mut parts, _body) = request.into_parts();
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let mut state = TunnelState::Start;

        let headers = transform_headers(
            &parts.headers,
            &self.config.injected_headers,
            TransformMode::Upgrade,
        );

        state = advance(state, TunnelState::DialingBackend);
        let (backend, selected_protocol) = match dial_backend(self.backend_url(), headers).await {
            Ok(dialed) => dialed,
            Err(e) => {
                advance(state, TunnelState::Failed);
                tracing::error!(
                    host = %host,
                    backend = %self.backend_url(),
                    error = %e,
                    "Error opening websocket connection"
                );
                metrics::record_tunnel_failure(e.stage());
                return (StatusCode::INTERNAL_SERVER_ERROR, DIAL_FAILED_BODY).into_response();
            }
        };

        state = advance(state, TunnelState::UpgradingClient);
        let upgrade = <WebSocketUpgrade as FromRequestParts<()>>::from_request_parts(&mut parts, &());
        let upgrade = match upgrade.await {
            Ok(upgrade) => upgrade,
            Err(rejection) => {
                advance(state, TunnelState::Failed);
                let e = TunnelError::from(rejection);
                tracing::error!(host = %host, error = %e, "Error upgrading websocket connection");
                metrics::record_tunnel_failure(e.stage());
                close_backend(backend).await;
                return (StatusCode::INTERNAL_SERVER_ERROR, UPGRADE_FAILED_BODY).into_response();
            }
        };

        let upgrade = match selected_protocol {
            Some(protocol) => upgrade.protocols([protocol]),
            None => upgrade,
        };

        tracing::info!(backend = %self.backend_url(), "Opened backend connection");

        let close_together = self.config.tunnel.close_together;
        let span = tracing::Span::current();
        upgrade
            .on_failed_upgrade(move |error| {
                // The backend socket is dropped with the unused upgrade callback.
                tracing::error!(tunnel = %id, error = %error, "Client connection upgrade failed, closing backend connection");
                metrics::record_tunnel_failure("upgrade");
            })
            .on_upgrade(move |client| {
                async move {
                    advance(state, TunnelState::Relaying);
                    metrics::record_tunnel_opened();
                    let relays = spawn_relays(client, backend);
                    if close_together {
                        tokio::spawn(close_pair_together(relays).in_current_span());
                    } else {
                        tokio::spawn(await_pair(relays).in_current_span());
                    }
                }
                .instrument(span)
            })
    }
}

fn advance(from: TunnelState, to: TunnelState) -> TunnelState {
    tracing::debug!(from = ?from, to = ?to, "Tunnel state change");
    to
}

/// Perform the backend handshake with the transformed headers.
///
/// Returns the connected socket and the subprotocol the backend selected.
async fn dial_backend(
    url: &Url,
    headers: HeaderSet,
) -> Result<(BackendSocket, Option<String>), TunnelError> {
    let mut request = url.as_str().into_client_request()?;
    for (name, value) in headers {
        // The dialer derives Host from the backend URL.
        if name == header::HOST {
            continue;
        }
        request.headers_mut().append(name, value);
    }

    let (socket, response) = connect_async(request).await?;
    let protocol = response
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|p| p.to_str().ok())
        .map(str::to_string);
    Ok((socket, protocol))
}

async fn close_backend(mut backend: BackendSocket) {
    if let Err(e) = backend.close(None).await {
        tracing::debug!(error = %e, "Error closing backend connection");
    }
}

/// The two relay tasks of one tunnel.
pub struct RelayPair {
    pub client_to_backend: JoinHandle<RelayOutcome>,
    pub backend_to_client: JoinHandle<RelayOutcome>,
}

/// Split both sockets and start one relay task per direction.
///
/// Each task owns the read half of one connection and the write half of
/// the other, so either direction can stop while the other keeps running.
pub fn spawn_relays(client: WebSocket, backend: BackendSocket) -> RelayPair {
    let (client_tx, client_rx) = client.split();
    let (backend_tx, backend_rx) = backend.split();

    let client_to_backend = tokio::spawn(
        relay_messages(Direction::ClientToBackend, client_rx, backend_tx).in_current_span(),
    );
    let backend_to_client = tokio::spawn(
        relay_messages(Direction::BackendToClient, backend_rx, client_tx).in_current_span(),
    );

    RelayPair {
        client_to_backend,
        backend_to_client,
    }
}

/// Wait for both directions to end on their own.
pub async fn await_pair(pair: RelayPair) {
    let (first, second) = tokio::join!(pair.client_to_backend, pair.backend_to_client);
    for result in [first, second] {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Relay task did not complete");
        }
    }
    advance(TunnelState::Relaying, TunnelState::Closed);
}

/// Abort the surviving direction once either relay ends.
///
/// Aborting drops the remaining socket halves, which closes both
/// connections.
pub async fn close_pair_together(pair: RelayPair) {
    let RelayPair {
        mut client_to_backend,
        mut backend_to_client,
    } = pair;

    let finished = tokio::select! {
        _ = &mut client_to_backend => {
            backend_to_client.abort();
            Direction::ClientToBackend
        }
        _ = &mut backend_to_client => {
            client_to_backend.abort();
            Direction::BackendToClient
        }
    };
    tracing::info!(finished = %finished, "Closing both tunnel directions");
    advance(TunnelState::Relaying, TunnelState::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunnel_ids_are_unique() {
        assert_ne!(TunnelId::new(), TunnelId::new());
        assert!(TunnelId::new().to_string().starts_with("tunnel-"));
    }

    #[test]
    fn error_stages() {
        let dial = TunnelError::Dial(tokio_tungstenite::tungstenite::Error::ConnectionClosed);
        assert_eq!(dial.stage(), "dial");
    }
}
