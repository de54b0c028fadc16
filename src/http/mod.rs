//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, pipeline composition, lifecycle)
//!     → request.rs (correlation id, optional generation)
//!     → middleware/ (lifecycle log, CORS, limits, classifier)
//!     → [route table decides handler group, gates guarded prefixes]
//!     → error.rs (handler failures parked for the classifier)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::AppError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, ListeningServer, Server, ServerError};
