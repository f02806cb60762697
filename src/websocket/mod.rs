//! WebSocket proxy handling.
//!
//! # Data Flow
//! ```text
//! Client ←── axum WebSocket ──→ Proxy ←── tokio-tungstenite ──→ Backend
//!                 relay (client → backend)
//!                 relay (backend → client)
//! ```
//!
//! # Design Decisions
//! - Backend handshake completes before the client is upgraded
//! - Message-level forwarding: text stays text, binary stays binary
//! - Ping/pong answered by each socket, not forwarded
//! - Each direction ends on its own unless `close_together` is set

pub mod frame;
pub mod relay;
pub mod tunnel;

pub use frame::{Frame, FrameKind, WireMessage};
pub use relay::{relay_messages, Direction, RelayEnd, RelayOutcome};
pub use tunnel::{TunnelError, TunnelState, WebSocketTunnel};
