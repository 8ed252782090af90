//! Service discovery: where does an application live on the network?
//!
//! # Responsibilities
//! - Map an application name to its base URL
//! - Honour explicit per-application overrides
//! - Force plaintext HTTP when asked (backends are reached without TLS)
//!
//! # Design Decisions
//! - Default rule is `{scheme}://{app}.{app_domain}`
//! - Development domains always resolve to http
//! - Overrides are consulted first and accept any non-blank name
//! - Names resolved through the domain rule must be valid DNS labels

use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

use crate::config::DiscoveryConfig;

const DEV_DOMAINS: &[&str] = &["dev.gov.uk", "localhost"];

/// Errors raised while locating an application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("invalid application name '{0}'")]
    InvalidName(String),

    #[error("no location known for application '{app}': {reason}")]
    Unresolvable { app: String, reason: String },
}

/// Looks up the network location of an application.
pub trait ServiceDiscovery: Send + Sync {
    /// Base URL of `app`. With `force_http` the scheme is always `http`.
    fn find(&self, app: &str, force_http: bool) -> Result<Url, DiscoveryError>;
}

/// Backend URL for `app`: its plaintext location with a trailing `/`.
pub fn backend_url(discovery: &dyn ServiceDiscovery, app: &str) -> Result<String, DiscoveryError> {
    let mut url = discovery.find(app, true)?.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

/// Domain-convention discovery with configurable overrides.
#[derive(Debug, Clone)]
pub struct PlekDiscovery {
    app_domain: String,
    overrides: BTreeMap<String, String>,
}

impl PlekDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            app_domain: config.app_domain.trim().trim_matches('.').to_string(),
            overrides: config.overrides.clone(),
        }
    }

    /// True when running against a development domain.
    pub fn is_dev_domain(&self) -> bool {
        DEV_DOMAINS.contains(&self.app_domain.as_str())
    }

    fn unresolvable(app: &str, reason: impl Into<String>) -> DiscoveryError {
        DiscoveryError::Unresolvable {
            app: app.to_string(),
            reason: reason.into(),
        }
    }
}

fn is_valid_app_name(app: &str) -> bool {
    !app.is_empty()
        && app.len() <= 63
        && !app.starts_with('-')
        && !app.ends_with('-')
        && app.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl ServiceDiscovery for PlekDiscovery {
    fn find(&self, app: &str, force_http: bool) -> Result<Url, DiscoveryError> {
        if app.trim().is_empty() {
            return Err(DiscoveryError::InvalidName(app.to_string()));
        }

        if let Some(raw) = self.overrides.get(app) {
            let mut url = Url::parse(raw).map_err(|e| Self::unresolvable(app, e.to_string()))?;
            if force_http && url.scheme() == "https" && url.set_scheme("http").is_err() {
                return Err(Self::unresolvable(app, "cannot downgrade override to http"));
            }
            return Ok(url);
        }

        // Only the domain rule needs the name to be a DNS label.
        if !is_valid_app_name(app) {
            return Err(DiscoveryError::InvalidName(app.to_string()));
        }

        if self.app_domain.is_empty() {
            return Err(Self::unresolvable(app, "no application domain configured"));
        }

        let scheme = if force_http || self.is_dev_domain() {
            "http"
        } else {
            "https"
        };
        Url::parse(&format!("{}://{}.{}", scheme, app, self.app_domain))
            .map_err(|e| Self::unresolvable(app, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery(domain: &str) -> PlekDiscovery {
        PlekDiscovery::new(&DiscoveryConfig {
            app_domain: domain.to_string(),
            overrides: BTreeMap::new(),
        })
    }

    #[test]
    fn test_domain_convention() {
        let d = discovery("production.alphagov.co.uk");
        assert_eq!(
            d.find("frontend", false).unwrap().as_str(),
            "https://frontend.production.alphagov.co.uk/"
        );
        assert_eq!(
            d.find("frontend", true).unwrap().as_str(),
            "http://frontend.production.alphagov.co.uk/"
        );
    }

    #[test]
    fn test_dev_domain_is_plaintext() {
        let d = discovery("dev.gov.uk");
        assert!(d.is_dev_domain());
        assert_eq!(d.find("publisher", false).unwrap().scheme(), "http");
    }

    #[test]
    fn test_override_downgraded_when_forced() {
        let mut config = DiscoveryConfig::default();
        config
            .overrides
            .insert("frontend".into(), "https://localhost:3005/fe".into());
        let d = PlekDiscovery::new(&config);

        assert_eq!(
            d.find("frontend", true).unwrap().as_str(),
            "http://localhost:3005/fe"
        );
        assert_eq!(backend_url(&d, "frontend").unwrap(), "http://localhost:3005/fe/");
    }

    #[test]
    fn test_override_applies_to_non_dns_names() {
        let mut config = DiscoveryConfig::default();
        config
            .overrides
            .insert("licence_finder".into(), "http://localhost:3014".into());
        let d = PlekDiscovery::new(&config);

        assert_eq!(
            d.find("licence_finder", true).unwrap().as_str(),
            "http://localhost:3014/"
        );
        assert_eq!(
            d.find("smart_answers", true),
            Err(DiscoveryError::InvalidName("smart_answers".into()))
        );
        assert!(matches!(d.find("  ", true), Err(DiscoveryError::InvalidName(_))));
    }

    #[test]
    fn test_backend_url_has_single_trailing_slash() {
        let d = discovery("dev.gov.uk");
        assert_eq!(backend_url(&d, "frontend").unwrap(), "http://frontend.dev.gov.uk/");
    }

    #[test]
    fn test_rejects_bad_names_and_missing_domain() {
        let d = discovery("dev.gov.uk");
        assert_eq!(
            d.find("front end", true),
            Err(DiscoveryError::InvalidName("front end".into()))
        );
        assert!(matches!(d.find("", true), Err(DiscoveryError::InvalidName(_))));

        let d = discovery("");
        assert!(matches!(
            d.find("frontend", true),
            Err(DiscoveryError::Unresolvable { .. })
        ));
    }
}
