//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the Router API:
//!     → reqwest client timeout (per request)
//!     → On failure: retries.rs (check if retryable, retry with backoff.rs)
//! ```
//!
//! # Design Decisions
//! - Timeouts live on the HTTP client; every call has a deadline
//! - No retries inside the reconciler itself; callers re-run whole operations

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
