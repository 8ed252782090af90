//! Configuration loading from disk and environment.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::PanopticonConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `discovery.app_domain`.
pub const APP_DOMAIN_ENV: &str = "GOVUK_APP_DOMAIN";
/// Overrides `router.url`.
pub const ROUTER_API_URL_ENV: &str = "ROUTER_API_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<PanopticonConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: PanopticonConfig = toml::from_str(&content)?;
    finish(config)
}

/// Build configuration from an optional file, applying environment overrides.
///
/// Without a file the defaults are used.
pub fn load_with_env(path: Option<&Path>) -> Result<PanopticonConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => PanopticonConfig::default(),
    };
    apply_env(&mut config, |key| env::var(key).ok());
    finish(config)
}

fn apply_env(config: &mut PanopticonConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(domain) = lookup(APP_DOMAIN_ENV).filter(|v| !v.trim().is_empty()) {
        config.discovery.app_domain = domain;
    }
    if let Some(url) = lookup(ROUTER_API_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.router.url = url;
    }
}

fn finish(config: PanopticonConfig) -> Result<PanopticonConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
