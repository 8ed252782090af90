//! Routing synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! publish / unpublish trigger
//!     → reconciler.rs (resolve target app, discover backend URL)
//!     → RouterApi: add_backend, stage routes, commit_routes
//!
//! Periodic repair (sync.rs):
//!     manifest of artefacts
//!     → submit each artefact independently
//!     → SyncReport (submitted / failed)
//! ```
//!
//! # Design Decisions
//! - One reconciler per artefact, no state kept between calls
//! - Prefixes are staged before exact paths, both in declared order
//! - Submit and delete are idempotent and safe to re-run after a failure

pub mod reconciler;
pub mod sync;

pub use reconciler::{ReconcileError, RouteReconciler};
pub use sync::{sync_all, SyncFailure, SyncReport, SyncService};
