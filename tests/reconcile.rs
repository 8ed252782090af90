//! Route reconciliation end to end.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panopticon::router_api::{InMemoryRouterApi, RouteType, RouterApi};
use panopticon::{ReconcileError, RouteReconciler};

mod common;

#[tokio::test]
async fn test_submit_against_http_router() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/backends/frontend"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/routes"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/routes/commit"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let router: Arc<dyn RouterApi> = Arc::new(common::http_router(&server.uri(), 1));
    let artefact = common::artefact("frontend", &[], &["/vat-rates"]);
    RouteReconciler::new(&artefact, router, common::dev_discovery())
        .submit()
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let seen: Vec<_> = requests
        .iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect();
    assert_eq!(
        seen,
        vec!["PUT /backends/frontend", "PUT /routes", "POST /routes/commit"]
    );

    let backend: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(
        backend,
        json!({ "backend": { "backend_url": "http://frontend.dev.gov.uk/" } })
    );
    let route: serde_json::Value = requests[1].body_json().unwrap();
    assert_eq!(route["route"]["incoming_path"], "/vat-rates");
    assert_eq!(route["route"]["route_type"], "exact");
    assert_eq!(route["route"]["backend_id"], "frontend");
}

#[tokio::test]
async fn test_commit_failure_surfaces_router_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/routes/commit"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let router: Arc<dyn RouterApi> = Arc::new(common::http_router(&server.uri(), 2));
    let artefact = common::artefact("frontend", &["/a"], &[]);
    let err = RouteReconciler::new(&artefact, router, common::dev_discovery())
        .submit()
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::RouterApi { op: "commit_routes", .. }));
}

#[tokio::test]
async fn test_submit_is_idempotent() {
    let router = Arc::new(InMemoryRouterApi::new());
    let artefact = common::artefact("frontend", &["/a", "/a/b"], &["/a/c"]);
    let reconciler = RouteReconciler::new(&artefact, router.clone(), common::dev_discovery());

    reconciler.submit().await.unwrap();
    let once = (router.backends(), router.live_routes());

    reconciler.submit().await.unwrap();
    assert_eq!((router.backends(), router.live_routes()), once);
    assert_eq!(once.1.len(), 3);
}

#[tokio::test]
async fn test_resubmit_reassigns_route_owner() {
    let router = Arc::new(InMemoryRouterApi::new());
    let first = common::artefact("frontend", &[], &["/bank-holidays"]);
    let second = common::artefact("calendars", &[], &["/bank-holidays"]);

    RouteReconciler::new(&first, router.clone(), common::dev_discovery())
        .submit()
        .await
        .unwrap();
    RouteReconciler::new(&second, router.clone(), common::dev_discovery())
        .submit()
        .await
        .unwrap();

    assert_eq!(
        router.route("/bank-holidays", RouteType::Exact).as_deref(),
        Some("calendars")
    );
}

#[tokio::test]
async fn test_delete_keeps_backend_registered() {
    let router = Arc::new(InMemoryRouterApi::new());
    let artefact = common::artefact("frontend", &["/a"], &["/b"]);
    let reconciler = RouteReconciler::new(&artefact, router.clone(), common::dev_discovery());

    reconciler.submit().await.unwrap();
    reconciler.delete().await.unwrap();
    assert!(router.live_routes().is_empty());
    assert!(router.backends().contains_key("frontend"));

    // Deleting again is a no-op, not an error.
    reconciler.delete().await.unwrap();
}
