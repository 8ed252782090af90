//! Panopticon route registration library.
//!
//! Keeps the Router in step with published content: each artefact's
//! rendering application is registered as a backend and its paths and
//! prefixes are staged as routes and committed in one batch.

pub mod artefact;
pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod router_api;
pub mod routing;

pub use artefact::Artefact;
pub use config::PanopticonConfig;
pub use routing::{ReconcileError, RouteReconciler};
