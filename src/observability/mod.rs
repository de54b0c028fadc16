//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request lifecycle + error classifier produce:
//!     → logging.rs (structured log events inside the request span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Correlation id lives on the request span, so every entry of a
//!   request carries it without handlers passing it around
//! - Metrics are cheap and no-ops until the exporter is installed

pub mod logging;
pub mod metrics;

#[doc(hidden)]
pub mod capture;
