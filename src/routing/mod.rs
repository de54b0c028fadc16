//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     (prefix, guarded, handler group)[]
//!     → table.rs (validate, order)
//!     → into_router (gate inserted per guarded prefix)
//!     → frozen axum Router
//!
//! Request:
//!     → axum prefix dispatch → [authorization gate] → handler group
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Each resource owns a disjoint prefix
//! - Unknown paths fall through to axum's 404

pub mod table;

pub use table::{HandlerGroup, RouteTable, RouteTableError};
