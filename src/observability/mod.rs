//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! content / response / http subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) attached to every HTTP span
//! - Faults that are absorbed (content drain, render_text) are always logged

pub mod logging;
pub mod metrics;
