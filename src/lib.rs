//! CRUD resource server library.
//!
//! Request pipeline (lifecycle logging, CORS, body limits, per-route
//! authorization, error classification) in front of generic resource
//! handler groups.

// Core subsystems
pub mod config;
pub mod http;
pub mod resources;
pub mod routing;

// Collaborators
pub mod services;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServerConfig;
pub use http::{AppState, ListeningServer, Server};
pub use lifecycle::Shutdown;
