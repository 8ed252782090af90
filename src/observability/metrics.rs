//! Reconciliation metrics.
//!
//! # Metrics
//! - `panopticon_routes_staged_total` (counter): route changes by op, route_type
//! - `panopticon_commits_total` (counter): commit calls by op
//! - `panopticon_router_errors_total` (counter): failed Router API calls by op
//!
//! Without an installed recorder these are no-ops.

use crate::router_api::RouteType;

pub fn record_route_staged(op: &'static str, route_type: RouteType) {
    metrics::counter!(
        "panopticon_routes_staged_total",
        "op" => op,
        "route_type" => route_type.as_str()
    )
    .increment(1);
}

pub fn record_commit(op: &'static str) {
    metrics::counter!("panopticon_commits_total", "op" => op).increment(1);
}

pub fn record_router_error(op: &'static str) {
    metrics::counter!("panopticon_router_errors_total", "op" => op).increment(1);
}
