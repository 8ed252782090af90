//! In-process Router API implementation.
//!
//! Models the Router's two route tables: changes land in a staged table and
//! only reach the live table on `commit_routes`. Every call is appended to
//! an ordered log so callers can inspect exactly what was issued.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;

use crate::router_api::types::{RouteOptions, RouteType, RouterApiError, RouterApiResult};
use crate::router_api::RouterApi;

/// Identity of a route: one owner per path and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteKey {
    pub path: String,
    pub route_type: RouteType,
}

impl RouteKey {
    pub fn new(path: impl Into<String>, route_type: RouteType) -> Self {
        Self {
            path: path.into(),
            route_type,
        }
    }
}

/// A call received by the in-memory router, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RouterCall {
    AddBackend {
        name: String,
        backend_url: String,
    },
    AddRoute {
        path: String,
        route_type: RouteType,
        backend: String,
        skip_commit: bool,
    },
    DeleteRoute {
        path: String,
        route_type: RouteType,
        skip_commit: bool,
    },
    Commit,
}

impl RouterCall {
    pub fn kind(&self) -> CallKind {
        match self {
            RouterCall::AddBackend { .. } => CallKind::AddBackend,
            RouterCall::AddRoute { .. } => CallKind::AddRoute,
            RouterCall::DeleteRoute { .. } => CallKind::DeleteRoute,
            RouterCall::Commit => CallKind::Commit,
        }
    }
}

/// Call categories, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    AddBackend,
    AddRoute,
    DeleteRoute,
    Commit,
}

#[derive(Debug, Default)]
struct RouterState {
    backends: BTreeMap<String, String>,
    /// `None` marks a staged deletion.
    staged: BTreeMap<RouteKey, Option<String>>,
    live: BTreeMap<RouteKey, String>,
    calls: Vec<RouterCall>,
    failures: Vec<(CallKind, RouterApiError)>,
}

/// Router API double holding all state in memory.
#[derive(Debug, Default)]
pub struct InMemoryRouterApi {
    state: Mutex<RouterState>,
}

impl InMemoryRouterApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every future call of `kind` fail with `error`.
    pub fn fail_on(&self, kind: CallKind, error: RouterApiError) {
        self.state().failures.push((kind, error));
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Every call received so far, including failed ones.
    pub fn calls(&self) -> Vec<RouterCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Registered backends and their URLs.
    pub fn backends(&self) -> BTreeMap<String, String> {
        self.state().backends.clone()
    }

    /// Routes visible to the public read surface (committed only).
    pub fn live_routes(&self) -> BTreeMap<RouteKey, String> {
        self.state().live.clone()
    }

    /// Number of changes waiting for a commit.
    pub fn pending_changes(&self) -> usize {
        self.state().staged.len()
    }

    /// Backend currently serving `path` with `route_type`, if committed.
    pub fn route(&self, path: &str, route_type: RouteType) -> Option<String> {
        self.state()
            .live
            .get(&RouteKey::new(path, route_type))
            .cloned()
    }

    fn record(&self, call: RouterCall) -> Result<MutexGuard<'_, RouterState>, RouterApiError> {
        let mut state = self.state();
        let kind = call.kind();
        state.calls.push(call);
        let failure = state
            .failures
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, err)| err.clone());
        match failure {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn commit(state: &mut RouterState) {
    let staged = std::mem::take(&mut state.staged);
    for (key, change) in staged {
        match change {
            Some(backend) => {
                state.live.insert(key, backend);
            }
            None => {
                state.live.remove(&key);
            }
        }
    }
}

#[async_trait]
impl RouterApi for InMemoryRouterApi {
    async fn add_backend(&self, name: &str, backend_url: &str) -> RouterApiResult<()> {
        let mut state = self.record(RouterCall::AddBackend {
            name: name.to_string(),
            backend_url: backend_url.to_string(),
        })?;
        state
            .backends
            .insert(name.to_string(), backend_url.to_string());
        Ok(())
    }

    async fn add_route(
        &self,
        path: &str,
        route_type: RouteType,
        backend: &str,
        options: RouteOptions,
    ) -> RouterApiResult<()> {
        let mut state = self.record(RouterCall::AddRoute {
            path: path.to_string(),
            route_type,
            backend: backend.to_string(),
            skip_commit: options.skip_commit,
        })?;

        if !state.backends.contains_key(backend) {
            return Err(RouterApiError::Status {
                status: 422,
                body: format!("backend '{}' does not exist", backend),
            });
        }

        state
            .staged
            .insert(RouteKey::new(path, route_type), Some(backend.to_string()));
        if !options.skip_commit {
            commit(&mut state);
        }
        Ok(())
    }

    async fn delete_route(
        &self,
        path: &str,
        route_type: RouteType,
        options: RouteOptions,
    ) -> RouterApiResult<()> {
        let mut state = self.record(RouterCall::DeleteRoute {
            path: path.to_string(),
            route_type,
            skip_commit: options.skip_commit,
        })?;

        let key = RouteKey::new(path, route_type);
        if state.live.contains_key(&key) || state.staged.contains_key(&key) {
            state.staged.insert(key, None);
        }
        if !options.skip_commit {
            commit(&mut state);
        }
        Ok(())
    }

    async fn commit_routes(&self) -> RouterApiResult<()> {
        let mut state = self.record(RouterCall::Commit)?;
        commit(&mut state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staged_routes_invisible_until_commit() {
        let router = InMemoryRouterApi::new();
        router.add_backend("frontend", "http://frontend/").await.unwrap();
        router
            .add_route("/vat-rates", RouteType::Exact, "frontend", RouteOptions::staged())
            .await
            .unwrap();

        assert_eq!(router.route("/vat-rates", RouteType::Exact), None);
        assert_eq!(router.pending_changes(), 1);

        router.commit_routes().await.unwrap();
        assert_eq!(
            router.route("/vat-rates", RouteType::Exact).as_deref(),
            Some("frontend")
        );
        assert_eq!(router.pending_changes(), 0);
    }

    #[tokio::test]
    async fn test_unstaged_route_commits_immediately() {
        let router = InMemoryRouterApi::new();
        router.add_backend("frontend", "http://frontend/").await.unwrap();
        router
            .add_route("/help", RouteType::Prefix, "frontend", RouteOptions::default())
            .await
            .unwrap();
        assert!(router.route("/help", RouteType::Prefix).is_some());
    }

    #[tokio::test]
    async fn test_route_requires_backend() {
        let router = InMemoryRouterApi::new();
        let err = router
            .add_route("/x", RouteType::Exact, "ghost", RouteOptions::staged())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterApiError::Status { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_deleting_absent_route_is_noop() {
        let router = InMemoryRouterApi::new();
        router
            .delete_route("/nowhere", RouteType::Exact, RouteOptions::staged())
            .await
            .unwrap();
        router.commit_routes().await.unwrap();
        assert!(router.live_routes().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_is_recorded() {
        let router = InMemoryRouterApi::new();
        router.fail_on(CallKind::Commit, RouterApiError::Timeout(5));

        assert_eq!(router.commit_routes().await, Err(RouterApiError::Timeout(5)));
        assert_eq!(router.calls(), vec![RouterCall::Commit]);

        router.clear_failures();
        assert!(router.commit_routes().await.is_ok());
    }
}
