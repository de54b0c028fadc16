//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request to a guarded prefix:
//!     → authorization.rs (bearer token → identity provider)
//!     → allowed: Identity attached, handler group runs
//!     → rejected: UnauthorizedError → classifier → 401
//! ```
//!
//! # Design Decisions
//! - Gating is per route, decided when the route table is composed
//! - Fail closed: a missing or unverifiable token never reaches a handler

pub mod authorization;

pub use authorization::{bearer_token, AuthorizationGate, BearerTokenGate};
