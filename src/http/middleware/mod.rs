//! Request pipeline middleware.
//!
//! # Order
//! ```text
//! request_lifecycle (ingress log, context, egress finalizer)
//!     → cors
//!     → body limits (raw and JSON)
//!     → result shaping extension
//!     → classify_errors
//!         → route table (authorization gate on guarded prefixes)
//!             → handler group
//! ```

pub mod classifier;
pub mod cors;
pub mod lifecycle;
pub mod pagination;

pub use classifier::{classify_errors, ErrorClassification, Verdict};
pub use lifecycle::{request_lifecycle, RequestContext};
pub use pagination::{ListQuery, Page, ResultShaping, ID_FIELD};
