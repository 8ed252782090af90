//! Router API client subsystem.
//!
//! # Data Flow
//! ```text
//! RouteReconciler
//!     → RouterApi trait (add_backend / add_route / delete_route / commit_routes)
//!         → client.rs  (HTTP, retries with backoff)
//!         → memory.rs  (in-process router for tests and dry runs)
//! ```
//!
//! # Design Decisions
//! - Explicit trait listing only the operations the reconciler needs
//! - Route changes staged with `skip_commit` stay invisible until `commit_routes`
//! - Backend registration is applied immediately, never staged
//! - Deleting an absent route is a no-op in every implementation

use async_trait::async_trait;

pub mod client;
pub mod memory;
pub mod types;

pub use client::HttpRouterApi;
pub use memory::{CallKind, InMemoryRouterApi, RouteKey, RouterCall};
pub use types::{RouteOptions, RouteType, RouterApiError, RouterApiResult};

/// Operations consumed from the remote Router service.
#[async_trait]
pub trait RouterApi: Send + Sync {
    /// Register or update a backend. Idempotent.
    async fn add_backend(&self, name: &str, backend_url: &str) -> RouterApiResult<()>;

    /// Point `path` at `backend`, reassigning any previous owner.
    async fn add_route(
        &self,
        path: &str,
        route_type: RouteType,
        backend: &str,
        options: RouteOptions,
    ) -> RouterApiResult<()>;

    /// Remove the route for `path`. Absent routes are ignored.
    async fn delete_route(
        &self,
        path: &str,
        route_type: RouteType,
        options: RouteOptions,
    ) -> RouterApiResult<()>;

    /// Apply every route change staged since the last commit.
    async fn commit_routes(&self) -> RouterApiResult<()>;
}
