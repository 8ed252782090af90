//! Router API wire-level types and error definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a route matches incoming request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    /// The request path must equal the route path.
    Exact,
    /// The request path must start with the route path.
    Prefix,
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Exact => "exact",
            RouteType::Prefix => "prefix",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options for route staging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Leave the change staged; a later `commit_routes` applies it.
    pub skip_commit: bool,
}

impl RouteOptions {
    /// Options for a change that joins the pending batch.
    pub fn staged() -> Self {
        Self { skip_commit: true }
    }
}

/// Errors returned by a Router API client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterApiError {
    /// Connection or protocol failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// No response within the configured deadline.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The Router API answered with a non-success status.
    #[error("router API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl RouterApiError {
    /// True for failures worth retrying: transport errors, timeouts and 5xx.
    ///
    /// 4xx responses are validation failures and will not change on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            RouterApiError::Transport(_) | RouterApiError::Timeout(_) => true,
            RouterApiError::Status { status, .. } => *status >= 500,
            RouterApiError::InvalidUrl(_) => false,
        }
    }
}

pub type RouterApiResult<T> = Result<T, RouterApiError>;
