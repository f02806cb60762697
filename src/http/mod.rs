//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → upgrade.rs (plain request or WebSocket upgrade?)
//!         plain:   headers::transform (plain) → forward.rs → backend
//!         upgrade: websocket::tunnel
//! ```

pub mod forward;
pub mod server;
pub mod upgrade;

pub use forward::{ForwardError, Forwarder};
pub use server::HttpServer;
pub use upgrade::is_websocket_upgrade;
