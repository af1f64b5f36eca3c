//! Serde data structures for the Tollgate configuration file.
//!
//! Contains [`Config`] (the root), [`Defaults`], [`Route`] and [`Target`].
//! All types derive `Serialize` and `Deserialize` with
//! `deny_unknown_fields` for strict parsing.

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    5000
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_defaults(v: &Defaults) -> bool {
    v.timeout == default_timeout()
}

const fn is_zero(v: &u64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_default_defaults")]
    pub defaults: Defaults,

    pub routes: Vec<Route>,
}

impl Config {
    /// Number of routes with a non-zero request limit.
    #[must_use]
    pub fn throttled_routes(&self) -> usize {
        self.routes.iter().filter(|r| r.limit > 0).count()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Milliseconds to wait for backend response headers.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub path: String,

    pub method: String,

    pub target: Target,

    /// Allow-list of forwarded query keys. `"*"` forwards the query verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<String>,

    /// Requests per client per window; `0` disables throttling.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub limit: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    pub host: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}
