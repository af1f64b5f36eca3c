//! Header forwarding and hop-by-hop stripping.
//!
//! [`build_forwarded_headers`] copies every inbound header value (including
//! the identifiers injected by the middleware chain), strips hop-by-hop
//! headers, points `Host` at the target authority and extends the
//! `X-Forwarded-*` family.

use std::net::IpAddr;
use std::sync::LazyLock;

use axum::http::header::{CONNECTION, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Remove the fixed hop-by-hop set plus every header named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(&listed) {
        headers.remove(name);
    }
}

/// Strip hop-by-hop headers from a backend response before relaying it.
///
/// `content-length` is kept: the body is streamed through unchanged.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    client_ip: Option<IpAddr>,
    target_authority: Option<&str>,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(original.len() + 4);
    for (name, value) in original {
        headers.append(name.clone(), value.clone());
    }

    strip_hop_by_hop(&mut headers);

    if let Some(authority) = target_authority {
        if let Ok(val) = HeaderValue::from_str(authority) {
            headers.insert(HOST, val);
        }
    }

    if let Some(ip) = client_ip {
        let ip = ip.to_string();
        let mut chain: Vec<&str> = original
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        chain.push(&ip);
        if let Ok(val) = HeaderValue::from_str(&chain.join(", ")) {
            headers.insert(X_FORWARDED_FOR, val);
        }
    }

    if let Some(original_host) = original.get(HOST) {
        headers.insert(X_FORWARDED_HOST, original_host.clone());
    }

    // Inbound traffic is plain HTTP; keep a scheme set by an outer proxy.
    if !headers.contains_key(X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    }

    headers
}
