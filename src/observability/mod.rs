//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured `tracing` events)
//!     → metrics.rs (counters through the `metrics` facade)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (tunnel id, direction, backend)
//! - Metrics are recorded through the facade only; no endpoint is exposed,
//!   an embedding application may install any recorder it likes

pub mod logging;
pub mod metrics;
