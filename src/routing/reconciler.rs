//! Reconcile one artefact's routes with the Router.
//!
//! # Responsibilities
//! - Resolve the application an artefact renders through
//! - Register that application as a Router backend
//! - Stage prefix and exact routes, then commit them in one call
//! - Stage route removals, then commit them in one call
//!
//! # Ordering
//! ```text
//! submit: add_backend → add_route(prefix)* → add_route(exact)* → commit_routes
//! delete:               delete_route(prefix)* → delete_route(exact)* → commit_routes
//! ```
//!
//! # Design Decisions
//! - Backend registration is applied immediately, outside the route batch
//! - Fail fast: the first error aborts the operation, nothing is rolled back
//! - Commit is issued only after every change was staged successfully
//! - `delete` leaves the backend registered for reuse on republish

use std::sync::Arc;

use thiserror::Error;

use crate::artefact::{Artefact, ResolutionError};
use crate::discovery::{self, DiscoveryError, ServiceDiscovery};
use crate::observability::metrics;
use crate::router_api::{RouteOptions, RouteType, RouterApi, RouterApiError};

/// Errors that can occur while reconciling routes.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The artefact names no usable application. No remote call was made.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The application's network location is unknown.
    #[error("service discovery failed: {0}")]
    ServiceDiscovery(#[from] DiscoveryError),

    /// The Router API rejected or failed a call.
    #[error("router API {op} failed: {source}")]
    RouterApi {
        op: &'static str,
        #[source]
        source: RouterApiError,
    },
}

/// Reconciles a single artefact against the Router.
pub struct RouteReconciler<'a> {
    artefact: &'a Artefact,
    router: Arc<dyn RouterApi>,
    discovery: Arc<dyn ServiceDiscovery>,
}

impl<'a> RouteReconciler<'a> {
    pub fn new(
        artefact: &'a Artefact,
        router: Arc<dyn RouterApi>,
        discovery: Arc<dyn ServiceDiscovery>,
    ) -> Self {
        Self {
            artefact,
            router,
            discovery,
        }
    }

    /// Application that will serve this artefact's routes.
    pub fn rendering_app(&self) -> Result<&'a str, ReconcileError> {
        Ok(self.artefact.resolve_rendering_app()?)
    }

    /// Plaintext base URL of the rendering application, ending in `/`.
    pub fn backend_url(&self) -> Result<String, ReconcileError> {
        let app = self.rendering_app()?;
        Ok(discovery::backend_url(self.discovery.as_ref(), app)?)
    }

    /// Register (or update) the rendering application as a backend.
    pub async fn ensure_application_exists(&self) -> Result<(), ReconcileError> {
        let app = self.rendering_app()?;
        let backend_url = self.backend_url()?;

        tracing::debug!(backend = app, backend_url = %backend_url, "Registering backend");
        self.router
            .add_backend(app, &backend_url)
            .await
            .map_err(|e| router_error("add_backend", e))
    }

    /// Register every route of the artefact and commit them together.
    pub async fn submit(&self) -> Result<(), ReconcileError> {
        let app = self.rendering_app()?;
        self.ensure_application_exists().await?;

        for (path, route_type) in self.routes() {
            tracing::debug!(
                path,
                route_type = %route_type,
                backend = app,
                "Registering route {} ({}) => {}",
                path,
                route_type,
                app
            );
            self.router
                .add_route(path, route_type, app, RouteOptions::staged())
                .await
                .map_err(|e| router_error("add_route", e))?;
            metrics::record_route_staged("submit", route_type);
        }

        self.commit("submit").await?;

        tracing::info!(
            artefact = %self.artefact.label(),
            backend = app,
            prefixes = self.artefact.prefixes.len(),
            paths = self.artefact.paths.len(),
            "Routes registered"
        );
        Ok(())
    }

    /// Remove every route of the artefact and commit the removal.
    pub async fn delete(&self) -> Result<(), ReconcileError> {
        for (path, route_type) in self.routes() {
            tracing::debug!(
                path,
                route_type = %route_type,
                "Removing route {} ({})",
                path,
                route_type
            );
            self.router
                .delete_route(path, route_type, RouteOptions::staged())
                .await
                .map_err(|e| router_error("delete_route", e))?;
            metrics::record_route_staged("delete", route_type);
        }

        self.commit("delete").await?;

        tracing::info!(
            artefact = %self.artefact.label(),
            prefixes = self.artefact.prefixes.len(),
            paths = self.artefact.paths.len(),
            "Routes removed"
        );
        Ok(())
    }

    /// Prefixes first, then exact paths, each in declared order.
    fn routes(&self) -> impl Iterator<Item = (&'a str, RouteType)> {
        let artefact = self.artefact;
        artefact
            .prefixes
            .iter()
            .map(|p| (p.as_str(), RouteType::Prefix))
            .chain(artefact.paths.iter().map(|p| (p.as_str(), RouteType::Exact)))
    }

    async fn commit(&self, op: &'static str) -> Result<(), ReconcileError> {
        self.router
            .commit_routes()
            .await
            .map_err(|e| router_error("commit_routes", e))?;
        metrics::record_commit(op);
        Ok(())
    }
}

fn router_error(op: &'static str, source: RouterApiError) -> ReconcileError {
    metrics::record_router_error(op);
    tracing::warn!(op, error = %source, "Router API call failed");
    ReconcileError::RouterApi { op, source }
}
