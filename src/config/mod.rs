//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs)  +  optional TOML file (loader.rs)
//!     → RawConfig (flags layered over file)
//!     → validation.rs (required values, header list lengths, backend URL)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with every request handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Any validation failure is fatal before a listener is bound
//! - The backend WebSocket URL is derived once, here

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::load_config;
pub use schema::{BackendConfig, ListenerConfig, ProxyConfig, RawConfig, TunnelConfig};
pub use validation::{validate_config, ConfigError};
