//! HTTP Router API client with timeout and retry handling.
//!
//! # Responsibilities
//! - Speak the Router API protocol (backends, routes, commit)
//! - Enforce a per-request deadline
//! - Retry transient failures via the configured `RetryPolicy`
//!
//! # Protocol
//! ```text
//! PUT    /backends/{name}   {"backend": {"backend_url": ...}}
//! PUT    /routes            {"route": {"incoming_path", "route_type", "handler": "backend", "backend_id"}}
//! DELETE /routes?incoming_path=..&route_type=..
//! POST   /routes/commit     {}
//! ```
//!
//! A 404 answer to `DELETE /routes` means the route was already absent and
//! is reported as success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::config::RouterApiConfig;
use crate::resilience::RetryPolicy;
use crate::router_api::types::{RouteOptions, RouteType, RouterApiError, RouterApiResult};
use crate::router_api::RouterApi;

/// Router API client over HTTP.
#[derive(Clone)]
pub struct HttpRouterApi {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl HttpRouterApi {
    /// Create a new client for the Router API at `config.url`.
    pub fn new(config: &RouterApiConfig, retry: RetryPolicy) -> RouterApiResult<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| RouterApiError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RouterApiError::InvalidUrl(config.url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("panopticon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RouterApiError::Transport(e.to_string()))?;

        tracing::debug!(
            router_api = %base_url,
            timeout_secs = config.timeout_secs,
            max_attempts = retry.max_attempts(),
            "Router API client initialized"
        );

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout_secs,
            retry,
        })
    }

    /// Base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> RouterApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RouterApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(
        &self,
        op: &'static str,
        method: Method,
        url: Url,
        body: Option<Value>,
        not_found_ok: bool,
    ) -> RouterApiResult<()> {
        let method = &method;
        let url = &url;
        let body = body.as_ref();
        self.retry
            .run(op, move || self.attempt(op, method.clone(), url, body, not_found_ok))
            .await
    }

    async fn attempt(
        &self,
        op: &'static str,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        not_found_ok: bool,
    ) -> RouterApiResult<()> {
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }
        if not_found_ok && status == StatusCode::NOT_FOUND {
            tracing::debug!(op, url = %url, "Route already absent, nothing to delete");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RouterApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> RouterApiError {
        if e.is_timeout() {
            RouterApiError::Timeout(self.timeout_secs)
        } else {
            RouterApiError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl RouterApi for HttpRouterApi {
    async fn add_backend(&self, name: &str, backend_url: &str) -> RouterApiResult<()> {
        let url = self.endpoint(&["backends", name])?;
        let body = json!({ "backend": { "backend_url": backend_url } });
        self.execute("add_backend", Method::PUT, url, Some(body), false)
            .await
    }

    async fn add_route(
        &self,
        path: &str,
        route_type: RouteType,
        backend: &str,
        options: RouteOptions,
    ) -> RouterApiResult<()> {
        let url = self.endpoint(&["routes"])?;
        let body = json!({
            "route": {
                "incoming_path": path,
                "route_type": route_type,
                "handler": "backend",
                "backend_id": backend,
            }
        });
        self.execute("add_route", Method::PUT, url, Some(body), false)
            .await?;

        if !options.skip_commit {
            self.commit_routes().await?;
        }
        Ok(())
    }

    async fn delete_route(
        &self,
        path: &str,
        route_type: RouteType,
        options: RouteOptions,
    ) -> RouterApiResult<()> {
        let mut url = self.endpoint(&["routes"])?;
        url.query_pairs_mut()
            .append_pair("incoming_path", path)
            .append_pair("route_type", route_type.as_str());
        self.execute("delete_route", Method::DELETE, url, None, true)
            .await?;

        if !options.skip_commit {
            self.commit_routes().await?;
        }
        Ok(())
    }

    async fn commit_routes(&self) -> RouterApiResult<()> {
        let url = self.endpoint(&["routes", "commit"])?;
        self.execute("commit_routes", Method::POST, url, Some(json!({})), false)
            .await
    }
}

impl std::fmt::Debug for HttpRouterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRouterApi")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> RouterApiResult<HttpRouterApi> {
        HttpRouterApi::new(
            &RouterApiConfig {
                url: url.to_string(),
                timeout_secs: 5,
            },
            RetryPolicy::none(),
        )
    }

    #[test]
    fn test_endpoint_building() {
        let api = client("http://router-api.dev.gov.uk").unwrap();
        assert_eq!(
            api.endpoint(&["routes", "commit"]).unwrap().as_str(),
            "http://router-api.dev.gov.uk/routes/commit"
        );

        let api = client("http://localhost:3056/api/").unwrap();
        assert_eq!(
            api.endpoint(&["backends", "frontend"]).unwrap().as_str(),
            "http://localhost:3056/api/backends/frontend"
        );
    }

    #[test]
    fn test_backend_names_are_escaped() {
        let api = client("http://router-api").unwrap();
        assert_eq!(
            api.endpoint(&["backends", "odd/name"]).unwrap().as_str(),
            "http://router-api/backends/odd%2Fname"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(matches!(client("not a url"), Err(RouterApiError::InvalidUrl(_))));
        assert!(matches!(client("mailto:router@example.com"), Err(RouterApiError::InvalidUrl(_))));
    }
}
