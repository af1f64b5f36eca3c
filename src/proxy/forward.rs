//! Outbound request dispatch.
//!
//! [`forward`] sends one request to the resolved target over the pooled
//! client and relays the backend response as a stream. Neither body is
//! buffered: the inbound body is handed to hyper as-is and the backend's
//! [`Incoming`] body is wrapped straight into the response. Dropping the
//! returned future (caller disconnected) drops the in-flight backend
//! request with it.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::Request;
use axum::response::Response;
use hyper::body::Incoming;

use super::headers::{build_forwarded_headers, strip_response_hop_by_hop};
use super::target::ResolvedTarget;
use crate::error::ForwardError;
use crate::server::HttpClient;

pub struct ForwardRequest<'a> {
    pub client: &'a HttpClient,
    pub target: &'a ResolvedTarget,
    pub inbound: &'a Parts,
    pub body: Body,
    pub client_ip: Option<IpAddr>,
    pub timeout: Duration,
}

pub async fn forward(req: ForwardRequest<'_>) -> Result<Response, ForwardError> {
    let start = Instant::now();
    let authority = req.target.authority();
    let headers = build_forwarded_headers(
        &req.inbound.headers,
        req.client_ip,
        authority.as_deref(),
    );

    let mut outbound = Request::builder()
        .method(req.target.method.clone())
        .uri(req.target.uri.clone())
        .body(req.body)?;
    *outbound.headers_mut() = headers;

    let response: http::Response<Incoming> =
        tokio::time::timeout(req.timeout, req.client.request(outbound))
            .await
            .map_err(|_| ForwardError::Timeout(req.timeout))??;

    tracing::debug!(
        target_url = %req.target.url,
        status = response.status().as_u16(),
        latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "backend responded"
    );

    let (mut parts, incoming) = response.into_parts();
    strip_response_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(incoming)))
}
