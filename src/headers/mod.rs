//! Header manipulation subsystem.
//!
//! # Data Flow
//! ```text
//! inbound HeaderMap
//!     → set.rs (ordered snapshot)
//!     → transform.rs (strip handshake headers if upgrading, append injected)
//!     → HeaderSet handed to the forwarder or the tunnel dialer
//! ```

pub mod set;
pub mod transform;

pub use set::HeaderSet;
pub use transform::{transform_headers, InjectedHeader, TransformMode, STRIP_SET};
