//! Target URL resolution.
//!
//! [`resolve`] is a pure function from a matched route and the inbound
//! request line to the outbound URL and method. It substitutes path
//! variables into the target path template, resolves that path against
//! the target host, applies the route's query allow-list and picks the
//! method override if one is configured.

use std::collections::HashMap;

use axum::http::{Method, Uri};
use url::{form_urlencoded, Url};

use super::routing::{CompiledRoute, QueryFilter};
use crate::error::TargetError;

#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub url: Url,
    pub uri: Uri,
    pub method: Method,
}

impl ResolvedTarget {
    /// `host[:port]` for the outbound `Host` header.
    #[must_use]
    pub fn authority(&self) -> Option<String> {
        let host = self.url.host_str()?;
        Some(
            self.url
                .port()
                .map_or_else(|| host.to_string(), |port| format!("{host}:{port}")),
        )
    }
}

pub fn resolve(
    route: &CompiledRoute,
    method: &Method,
    query: Option<&str>,
    params: &HashMap<String, String>,
) -> Result<ResolvedTarget, TargetError> {
    let path = substitute_params(&route.target.path, params);

    let mut url = Url::parse(&route.target.host).map_err(|source| TargetError::InvalidHost {
        host: route.target.host.clone(),
        source,
    })?;

    let resolved_path = resolve_path(url.path(), &path);
    url.set_path(&resolved_path);
    url.set_fragment(None);
    url.set_query(filter_query(&route.query, query).as_deref());

    let uri = url
        .as_str()
        .parse::<Uri>()
        .map_err(|source| TargetError::InvalidUri {
            url: url.to_string(),
            source,
        })?;

    Ok(ResolvedTarget {
        url,
        uri,
        method: route.target.method.clone().unwrap_or_else(|| method.clone()),
    })
}

/// Replace `{name}` placeholders with bound path variables in one pass.
/// Placeholders without a binding are kept as literal text.
#[must_use]
pub fn substitute_params(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('}') else {
            break;
        };
        let name = &after[1..close];
        match params.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&after[..=close]),
        }
        rest = &after[close + 1..];
    }

    // Either fully consumed or an unterminated `{` remains.
    if let Some(open) = rest.find('{') {
        out.push_str(&rest[open..]);
    } else {
        out.push_str(rest);
    }
    out
}

/// Resolve a path-only reference against `base`: absolute paths replace
/// the base path, relative ones are merged with its directory, and an
/// empty reference keeps the base path.
fn resolve_path(base: &str, reference: &str) -> String {
    if reference.is_empty() {
        return base.to_string();
    }
    if reference.starts_with('/') {
        return reference.to_string();
    }
    let dir = base.rfind('/').map_or("/", |i| &base[..=i]);
    format!("{dir}{reference}")
}

/// Build the outbound query string, or `None` when nothing survives.
#[must_use]
pub fn filter_query(filter: &QueryFilter, raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|q| !q.is_empty())?;

    match filter {
        QueryFilter::All => Some(raw.to_string()),
        QueryFilter::Only(allowed) => {
            let pairs: Vec<(String, String)> = form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect();

            let mut serializer = form_urlencoded::Serializer::new(String::new());
            let mut kept = 0usize;
            for key in allowed {
                for (_, value) in pairs.iter().filter(|(k, _)| k == key) {
                    serializer.append_pair(key, value);
                    kept += 1;
                }
            }

            (kept > 0).then(|| serializer.finish())
        }
    }
}
