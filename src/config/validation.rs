//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors: empty route lists, malformed paths and placeholders, bad HTTP
//! methods, duplicate routes, duplicate query parameters and malformed
//! target hosts. Every problem is collected into a list of
//! [`ValidationError`] values with per-field suggestions, so one run
//! reports everything that needs fixing.

use std::collections::HashSet;

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

pub const VALID_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "CONNECT", "TRACE",
];

/// Validate a single route path. Returns `Ok(())` or a human-readable error.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err("path must start with '/'".into());
    }
    if path.contains(['?', '#']) {
        return Err("path cannot contain '?' or '#'".into());
    }
    for segment in path.split('/') {
        if segment.contains(['{', '}']) && !is_placeholder(segment) {
            return Err(format!(
                "segment '{segment}' must be a whole '{{name}}' placeholder"
            ));
        }
    }
    Ok(())
}

/// Validate a target host. Returns `Ok(())` or a human-readable error.
pub fn validate_host(host: &str) -> Result<(), String> {
    if host.is_empty() {
        return Err("host cannot be empty".into());
    }
    match Url::parse(host) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if !parsed.has_host() {
                Err(format!("'{host}' has no authority"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{host}' is not a valid absolute URL")),
    }
}

/// Validate an HTTP method string. Returns `Ok(())` or a human-readable error.
pub fn validate_method(method: &str) -> Result<(), String> {
    let upper = method.to_uppercase();
    if VALID_METHODS.contains(&upper.as_str()) {
        Ok(())
    } else {
        Err(format!("'{method}' is not a valid HTTP method"))
    }
}

fn is_placeholder(segment: &str) -> bool {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .is_some_and(|name| {
            !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        })
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.defaults.timeout == 0 {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "defaults.timeout".into(),
            message: "timeout must be greater than zero".into(),
            suggestion: None,
        });
    }

    if config.routes.is_empty() {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_routes = HashSet::new();

    for (i, route) in config.routes.iter().enumerate() {
        let route_id = if route.path.is_empty() {
            format!("routes[{i}]")
        } else {
            route.path.clone()
        };

        if let Err(msg) = validate_path(&route.path) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "path".into(),
                message: msg,
                suggestion: if !route.path.is_empty() && !route.path.starts_with('/') {
                    Some(format!("did you mean '/{}'?", route.path))
                } else {
                    None
                },
            });
        }

        if let Err(msg) = validate_method(&route.method) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "method".into(),
                message: msg,
                suggestion: None,
            });
        }

        if !seen_routes.insert((route.method.to_uppercase(), route.path.as_str())) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "path".into(),
                message: format!("duplicate route for method {}", route.method),
                suggestion: None,
            });
        }

        let mut seen_params = HashSet::new();
        for param in &route.query_params {
            if !seen_params.insert(param.as_str()) {
                errors.push(ValidationError {
                    route: route_id.clone(),
                    field: "query_params".into(),
                    message: format!("query parameter '{param}' is listed more than once"),
                    suggestion: None,
                });
            }
        }

        if let Err(msg) = validate_host(&route.target.host) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "target.host".into(),
                message: msg,
                suggestion: None,
            });
        }

        if let Some(ref method) = route.target.method {
            if let Err(msg) = validate_method(method) {
                errors.push(ValidationError {
                    route: route_id.clone(),
                    field: "target.method".into(),
                    message: msg,
                    suggestion: None,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!(
        "  {} routes, {} throttled\n",
        config.routes.len(),
        config.throttled_routes()
    )];

    for route in &config.routes {
        let target_method = route
            .target
            .method
            .as_deref()
            .unwrap_or(route.method.as_str());
        let limit = if route.limit == 0 {
            "unlimited".to_string()
        } else {
            format!("{}/min per client", route.limit)
        };
        let query = if route.query_params.is_empty() {
            "(none)".to_string()
        } else {
            route.query_params.join(", ")
        };

        lines.push(format!(
            "  {} {}  -> {} {}{}",
            route.method.to_uppercase(),
            route.path,
            target_method.to_uppercase(),
            route.target.host,
            route.target.path,
        ));
        lines.push(format!("    query: {query}"));
        lines.push(format!("    limit: {limit}"));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Config, Defaults, Route, Target};

    fn route(path: &str) -> Route {
        Route {
            path: path.into(),
            method: "GET".into(),
            target: Target {
                host: "http://localhost:8080".into(),
                path: "/test".into(),
                method: None,
            },
            query_params: vec![],
            limit: 0,
        }
    }

    fn config(routes: Vec<Route>) -> Config {
        Config {
            defaults: Defaults::default(),
            routes,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&config(vec![route("/test/{id}")])).is_ok());
    }

    #[test]
    fn empty_routes_fails() {
        let errors = validate(&config(vec![])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one route"));
    }

    #[test]
    fn path_without_slash_fails() {
        let errors = validate(&config(vec![route("test")])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean '/test'?")));
    }

    #[test]
    fn path_with_query_or_fragment_fails() {
        let errors = validate(&config(vec![route("/a?b=1"), route("/c#d")])).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("'?' or '#'")));
    }

    #[test]
    fn partial_placeholder_fails() {
        let errors = validate(&config(vec![route("/users/id-{id}")])).unwrap_err();
        assert!(errors[0].message.contains("placeholder"));
    }

    #[test]
    fn invalid_method_fails() {
        let mut r = route("/test");
        r.method = "FETCH".into();
        let errors = validate(&config(vec![r])).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "method" && e.message.contains("not a valid HTTP method")));
    }

    #[test]
    fn lowercase_method_is_accepted() {
        let mut r = route("/test");
        r.method = "post".into();
        assert!(validate(&config(vec![r])).is_ok());
    }

    #[test]
    fn invalid_target_method_fails() {
        let mut r = route("/test");
        r.target.method = Some("BREW".into());
        let errors = validate(&config(vec![r])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "target.method"));
    }

    #[test]
    fn duplicate_query_params_fail() {
        let mut r = route("/test");
        r.query_params = vec!["a".into(), "b".into(), "a".into()];
        let errors = validate(&config(vec![r])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'a'"));
    }

    #[test]
    fn duplicate_method_and_path_fails() {
        let mut post = route("/test");
        post.method = "POST".into();
        assert!(validate(&config(vec![route("/test"), post])).is_ok());

        let errors = validate(&config(vec![route("/test"), route("/test")])).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate route")));
    }

    #[test]
    fn empty_or_relative_host_fails() {
        let mut empty = route("/a");
        empty.target.host = String::new();
        let mut relative = route("/b");
        relative.target.host = "backend/api".into();
        let mut ftp = route("/c");
        ftp.target.host = "ftp://files".into();

        let errors = validate(&config(vec![empty, relative, ftp])).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.field == "target.host"));
        assert!(errors[2].message.contains("unsupported scheme"));
    }

    #[test]
    fn collects_every_error() {
        let mut r = route("nope");
        r.method = "FETCH".into();
        r.target.host = "not a url".into();
        let errors = validate(&config(vec![r])).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
