//! Compiled route table and first-match route lookup.
//!
//! [`RouteTable`] is built once from the validated config and never
//! mutated afterwards, so request tasks read it without locking. Each
//! route pattern is split into literal and `{name}` segments up front;
//! [`RouteTable::match_route`] walks the routes in registration order and
//! returns the first one whose method is equal and whose segments all
//! match, together with the captured path variables.

use std::collections::HashMap;

use axum::http::Method;

use crate::config::model::{Config, Route};
use crate::config::validation::validate;
use crate::error::{GatewayError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Which inbound query parameters reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Forward the raw query string untouched.
    All,
    /// Forward only these keys, in this order. Empty forwards nothing.
    Only(Vec<String>),
}

impl QueryFilter {
    fn from_allow_list(params: &[String]) -> Self {
        if params.iter().any(|p| p == "*") {
            Self::All
        } else {
            Self::Only(params.to_vec())
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledTarget {
    pub host: String,
    pub path: String,
    pub method: Option<Method>,
}

#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub method: Method,
    pub pattern: String,
    pub target: CompiledTarget,
    pub query: QueryFilter,
    pub limit: u64,
    segments: Vec<Segment>,
}

impl CompiledRoute {
    fn compile(index: usize, route: &Route) -> Result<Self, ValidationError> {
        let route_id = if route.path.is_empty() {
            format!("routes[{index}]")
        } else {
            route.path.clone()
        };

        let method = parse_method(&route.method).map_err(|message| ValidationError {
            route: route_id.clone(),
            field: "method".into(),
            message,
            suggestion: None,
        })?;

        let target_method = route
            .target
            .method
            .as_deref()
            .map(parse_method)
            .transpose()
            .map_err(|message| ValidationError {
                route: route_id,
                field: "target.method".into(),
                message,
                suggestion: None,
            })?;

        Ok(Self {
            method,
            pattern: route.path.clone(),
            target: CompiledTarget {
                host: route.target.host.clone(),
                path: route.target.path.clone(),
                method: target_method,
            },
            query: QueryFilter::from_allow_list(&route.query_params),
            limit: route.limit,
            segments: split_segments(&route.path)
                .map(|s| match placeholder_name(s) {
                    Some(name) => Segment::Param(name.to_string()),
                    None => Segment::Literal(s.to_string()),
                })
                .collect(),
        })
    }

    /// Match `path` against this route's pattern, returning the bound
    /// variables on success. The method is not checked here.
    ///
    /// Matching is strict: a trailing slash or an empty segment is a
    /// mismatch, and a variable never binds an empty, `.` or `..` segment
    /// (percent-encoded dots included).
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut params = HashMap::new();
        let mut request_segments = split_segments(path);

        for segment in &self.segments {
            let value = request_segments.next()?;
            match segment {
                Segment::Literal(lit) if lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if value.is_empty() || is_dot_segment(value) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), value.to_string());
                }
            }
        }

        if request_segments.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// The result of a successful dispatch, attached to the request as an
/// extension for the inner middleware stages and the forwarding handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub index: usize,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Validate `config` and compile its routes.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        validate(config).map_err(|errors| GatewayError::ConfigValidation { errors })?;
        Self::compile(&config.routes)
    }

    /// Compile routes without the full validation pass. Only the HTTP
    /// methods must parse; hosts are checked per request by the resolver.
    pub fn compile(routes: &[Route]) -> Result<Self, GatewayError> {
        let mut compiled = Vec::with_capacity(routes.len());
        let mut errors = Vec::new();
        for (i, route) in routes.iter().enumerate() {
            match CompiledRoute::compile(i, route) {
                Ok(r) => compiled.push(r),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(Self { routes: compiled })
        } else {
            Err(GatewayError::ConfigValidation { errors })
        }
    }

    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .enumerate()
            .filter(|(_, route)| route.method == *method)
            .find_map(|(index, route)| {
                route
                    .match_path(path)
                    .map(|params| RouteMatch { index, params })
            })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CompiledRoute> {
        self.routes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// `.` or `..`, in any mix of literal and `%2e` dots. Substituted into a
/// target template, these would be collapsed by URL normalisation.
fn is_dot_segment(segment: &str) -> bool {
    let dots = segment.to_ascii_lowercase().replace("%2e", ".");
    dots == "." || dots == ".."
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

fn parse_method(method: &str) -> Result<Method, String> {
    Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|_| format!("'{method}' is not a valid HTTP method"))
}
