//! Shared helpers for integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use panopticon::config::{DiscoveryConfig, RetryConfig, RouterApiConfig};
use panopticon::discovery::{PlekDiscovery, ServiceDiscovery};
use panopticon::resilience::RetryPolicy;
use panopticon::router_api::HttpRouterApi;
use panopticon::Artefact;

/// Discovery resolving `{app}.dev.gov.uk`.
#[allow(dead_code)]
pub fn dev_discovery() -> Arc<dyn ServiceDiscovery> {
    Arc::new(PlekDiscovery::new(&DiscoveryConfig {
        app_domain: "dev.gov.uk".to_string(),
        overrides: BTreeMap::new(),
    }))
}

/// HTTP client pointed at a mock Router API, with near-instant retries.
pub fn http_router(uri: &str, max_attempts: u32) -> HttpRouterApi {
    let retry = RetryPolicy::from_config(&RetryConfig {
        enabled: true,
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 5,
    });
    HttpRouterApi::new(
        &RouterApiConfig {
            url: uri.to_string(),
            timeout_secs: 5,
        },
        retry,
    )
    .expect("mock server URI is valid")
}

#[allow(dead_code)]
pub fn artefact(rendering_app: &str, prefixes: &[&str], paths: &[&str]) -> Artefact {
    Artefact {
        slug: None,
        rendering_app: Some(rendering_app.to_string()),
        owning_app: None,
        paths: paths.iter().map(|p| p.to_string()).collect(),
        prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
    }
}
