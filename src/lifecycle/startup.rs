//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the Router API client from validated configuration
//! - Build service discovery
//! - Swap in the in-memory router for dry runs
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Collaborators are handed out as trait objects so callers never care
//!   which Router implementation is behind them

use std::sync::Arc;

use thiserror::Error;

use crate::config::PanopticonConfig;
use crate::discovery::{PlekDiscovery, ServiceDiscovery};
use crate::resilience::RetryPolicy;
use crate::router_api::{HttpRouterApi, InMemoryRouterApi, RouterApi, RouterApiError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot create Router API client: {0}")]
    RouterApi(#[from] RouterApiError),
}

/// Everything a command needs to talk to the Router.
pub struct Context {
    pub config: PanopticonConfig,
    pub router: Arc<dyn RouterApi>,
    pub discovery: Arc<dyn ServiceDiscovery>,
    /// Present in dry-run mode; records what would have been sent.
    pub dry_run: Option<Arc<InMemoryRouterApi>>,
}

/// Wire up collaborators for `config`.
pub fn build_context(config: PanopticonConfig, dry_run: bool) -> Result<Context, StartupError> {
    let discovery: Arc<dyn ServiceDiscovery> = Arc::new(PlekDiscovery::new(&config.discovery));

    let recorder = dry_run.then(|| Arc::new(InMemoryRouterApi::new()));
    let router: Arc<dyn RouterApi> = match &recorder {
        Some(memory) => {
            tracing::info!("Dry run: Router API calls are recorded, not sent");
            memory.clone()
        }
        None => {
            let retry = RetryPolicy::from_config(&config.retries);
            let client = HttpRouterApi::new(&config.router, retry)?;
            tracing::info!(router_api = %client.base_url(), "Using Router API");
            Arc::new(client)
        }
    };

    Ok(Context {
        config,
        router,
        discovery,
        dry_run: recorder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_uses_recorder() {
        let ctx = build_context(PanopticonConfig::default(), true).unwrap();
        assert!(ctx.dry_run.is_some());
    }

    #[test]
    fn test_invalid_router_url_fails() {
        let mut config = PanopticonConfig::default();
        config.router.url = "nonsense".into();
        assert!(build_context(config, false).is_err());
    }
}
