//! Throttling stage.
//!
//! Identifies the client, then asks the shared [`Throttler`](crate::throttle::Throttler)
//! to admit the request for the matched route. Denied requests get a 429
//! JSON body and never reach the forwarding handler.

use std::net::IpAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::proxy::peer_ip;
use crate::proxy::routing::RouteMatch;
use crate::server::AppState;

const CLIENT_HEADERS: [&str; 2] = ["x-forwarded-for", "x-real-ip"];

/// Client identity used as the throttle key: the first entry of
/// `X-Forwarded-For`, else `X-Real-IP`, else the peer IP.
#[must_use]
pub fn client_id(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    for name in CLIENT_HEADERS {
        let first = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(client) = first {
            return client.to_string();
        }
    }
    peer.map_or_else(|| "unknown".to_string(), |ip| ip.to_string())
}

pub async fn throttle(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let Some(route) = req.extensions().get::<RouteMatch>().map(|m| m.index) else {
        return next.run(req).await;
    };

    let client = client_id(req.headers(), peer_ip(&req));
    if state.throttler.try_acquire(route, &client) {
        return next.run(req).await;
    }

    tracing::debug!(route, client = %client, "request throttled");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "error": "Rate limit exceeded" })),
    )
        .into_response()
}
