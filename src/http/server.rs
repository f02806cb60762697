//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Classify each request as plain or WebSocket upgrade
//! - Apply header injection and hand off to the forwarder or the tunnel
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::headers::{transform_headers, TransformMode};
use crate::lifecycle::ShutdownSignal;
use crate::http::forward::Forwarder;
use crate::http::upgrade::is_websocket_upgrade;
use crate::observability::metrics;
use crate::websocket::WebSocketTunnel;

/// Body sent when a plain request cannot be forwarded.
pub const UPSTREAM_FAILED_BODY: &str = "upstream request failed";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub forwarder: Forwarder,
    pub tunnel: WebSocketTunnel,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            forwarder: Forwarder::new(config.backend.url.clone()),
            tunnel: WebSocketTunnel::new(config.clone()),
            config: config.clone(),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving or for driving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener, std::io::Error> {
        TcpListener::bind(self.config.listener.bind_address()).await
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.url,
            websocket_backend = %self.config.backend.websocket_url,
            injected_headers = self.config.injected_headers.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("No longer accepting connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Upgrades go to the tunnel; everything else is forwarded with injected headers.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if is_websocket_upgrade(request.headers()) {
        metrics::record_request("websocket");
        return state.tunnel.open(request).await;
    }
    metrics::record_request("plain");

    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (mut parts, body) = request.into_parts();
    parts.headers = transform_headers(
        &parts.headers,
        &state.config.injected_headers,
        TransformMode::Plain,
    )
    .into_header_map();

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    match state
        .forwarder
        .forward(Request::from_parts(parts, body), client_addr)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Upstream error");
            metrics::record_upstream_error();
            (StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILED_BODY).into_response()
        }
    }
}
