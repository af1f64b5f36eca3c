//! The per-request middleware chain.
//!
//! Every matched request passes through the stages in [`CHAIN`], outermost
//! first, before reaching the forwarding handler. The order is fixed here
//! and applied in one place by [`apply`]; stages do not know about each
//! other beyond the request extensions they read.

pub mod access_log;
pub mod request_id;
pub mod throttle;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;

use crate::server::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Fresh `x-request-id` / `x-trace-id` on every request.
    InjectIds,
    /// One `request completed` event per request.
    AccessLog,
    /// Per-route, per-client admission.
    Throttle,
}

impl Stage {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InjectIds => "inject_ids",
            Self::AccessLog => "access_log",
            Self::Throttle => "throttle",
        }
    }
}

/// Stage order, outermost first. Throttled requests are still logged and
/// still carry identifiers.
pub const CHAIN: [Stage; 3] = [Stage::InjectIds, Stage::AccessLog, Stage::Throttle];

/// Wrap `router` in every stage of [`CHAIN`].
pub fn apply(router: Router<Arc<AppState>>, state: &Arc<AppState>) -> Router<Arc<AppState>> {
    // Later `.layer` calls wrap earlier ones, so install innermost first.
    CHAIN.iter().rev().fold(router, |router, stage| {
        tracing::trace!(stage = stage.name(), "installing middleware stage");
        match stage {
            Stage::InjectIds => router.layer(from_fn(request_id::inject_ids)),
            Stage::AccessLog => router.layer(from_fn(access_log::access_log)),
            Stage::Throttle => {
                router.layer(from_fn_with_state(Arc::clone(state), throttle::throttle))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_order_is_fixed() {
        let names: Vec<_> = CHAIN.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["inject_ids", "access_log", "throttle"]);
    }
}
