//! Route dispatch and the forwarding handler.
//!
//! [`dispatch`] is the outermost layer: it matches the request against the
//! [`RouteTable`](routing::RouteTable), answers a miss with a bare 404 and
//! otherwise attaches the [`RouteMatch`] for the middleware chain.
//! [`forward_handler`] is the Axum fallback at the bottom of the chain; it
//! resolves the target URL and streams the request through
//! [`forward::forward`]. Submodules handle route matching ([`routing`]),
//! URL resolution ([`target`]), header construction ([`headers`]) and the
//! outbound call ([`forward`]).

pub mod forward;
pub mod headers;
pub mod routing;
pub mod target;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::server::AppState;
use routing::RouteMatch;

/// Peer address recorded by `into_make_service_with_connect_info`, if any.
#[must_use]
pub fn peer_ip(req: &Request) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

pub async fn dispatch(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let Some(matched) = state.routes.match_route(req.method(), req.uri().path()) else {
        tracing::debug!(
            method = %req.method(),
            path = %req.uri().path(),
            "no route matched"
        );
        return StatusCode::NOT_FOUND.into_response();
    };

    req.extensions_mut().insert(matched);
    next.run(req).await
}

pub async fn forward_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let client_ip = peer_ip(&req);
    let (parts, body) = req.into_parts();

    let Some(matched) = parts.extensions.get::<RouteMatch>() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(route) = state.routes.get(matched.index) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let resolved = match target::resolve(route, &parts.method, parts.uri.query(), &matched.params)
    {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(
                route = %route.pattern,
                error = %e,
                "failed to resolve target"
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid Target URL").into_response();
        }
    };

    let request = forward::ForwardRequest {
        client: &state.http_client,
        target: &resolved,
        inbound: &parts,
        body,
        client_ip,
        timeout: state.timeout,
    };

    match forward::forward(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                target_url = %resolved.url,
                error = %e,
                "forwarding failed"
            );
            (StatusCode::BAD_GATEWAY, format!("Proxy error: {e}")).into_response()
        }
    }
}
