//! Header-injecting forwarding proxy.
//!
//! Forwards HTTP and WebSocket traffic from a local port to one backend,
//! appending configured headers to every request and every backend
//! WebSocket handshake.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!  Client request       │  http::server ──▶ http::upgrade              │
//!  ─────────────────────┼─▶     │               │                      │
//!                       │       │ plain         │ upgrade              │
//!                       │       ▼               ▼                      │
//!                       │  headers::transform  headers::transform      │
//!                       │   (append)           (strip + append)        │
//!                       │       │               │                      │
//!                       │       ▼               ▼                      │
//!                       │  http::forward   websocket::tunnel ──────────┼──▶ Backend
//!                       │                   dial → upgrade → relay ×2  │
//!                       └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod echo;
pub mod headers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod websocket;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
