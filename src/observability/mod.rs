//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Reconciler, Router API client, sync loop produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters via the metrics facade)
//! ```
//!
//! # Design Decisions
//! - Structured fields (path, route_type, backend) on every route log line
//! - JSON format for production, human readable for development

pub mod logging;
pub mod metrics;
