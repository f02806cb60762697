//! Configuration schema definitions.
//!
//! `RawConfig` is what the command line and the optional TOML file provide.
//! `ProxyConfig` is the validated, immutable form every subsystem reads.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::headers::InjectedHeader;

/// Default scheme used when dialing the backend for WebSocket tunnels.
pub const DEFAULT_WEBSOCKET_SCHEME: &str = "ws";

/// Default interface the listener binds to.
pub const DEFAULT_LISTEN_HOST: &str = "localhost";

/// Unvalidated settings, as read from flags and/or a config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RawConfig {
    /// Port on which to listen. Must be nonzero.
    pub port: Option<u16>,

    /// Interface to bind (default: `localhost`).
    pub host: Option<String>,

    /// URL of the backend HTTP server to proxy.
    pub backend: Option<String>,

    /// Header names to inject into every request.
    pub insert_header: Vec<String>,

    /// Header values, positionally matching `insert_header`.
    pub insert_header_val: Vec<String>,

    /// Scheme used to dial the backend for WebSocket connections.
    pub websocket_scheme: Option<String>,

    /// Tear down both relay directions as soon as one of them ends.
    pub close_together: Option<bool>,
}

/// Validated root configuration for the proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// The single backend every request is forwarded to.
    pub backend: BackendConfig,

    /// Headers appended to every forwarded request and backend handshake.
    pub injected_headers: Vec<InjectedHeader>,

    /// WebSocket tunnel behavior.
    pub tunnel: TunnelConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
}

impl ListenerConfig {
    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL for plain HTTP forwarding.
    pub url: Url,

    /// Scheme substituted into `url` for WebSocket dials.
    pub websocket_scheme: String,

    /// `url` with its scheme replaced by `websocket_scheme`.
    pub websocket_url: Url,
}

/// How the two directions of a tunnel relate once one of them ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunnelConfig {
    /// When false, each direction closes independently.
    pub close_together: bool,
}
