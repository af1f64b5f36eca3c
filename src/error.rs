//! Unified error types for Tollgate.
//!
//! Defines [`GatewayError`] (process-level failures, fatal at startup),
//! [`ValidationError`] for config validation failures, and the two
//! per-request error enums: [`TargetError`] (target resolution, answered
//! with 500) and [`ForwardError`] (backend forwarding, answered with 502).

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub route: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  route {}: {}: {}", self.route, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Failure to turn a matched route into an outbound URL.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target URL '{url}' is not a valid request URI: {source}")]
    InvalidUri {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },
}

/// Failure while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("backend did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("failed to build backend request: {0}")]
    Request(#[from] http::Error),

    #[error("{0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_listed_one_per_line() {
        let err = GatewayError::ConfigValidation {
            errors: vec![
                ValidationError {
                    route: "/a".into(),
                    field: "method".into(),
                    message: "'FETCH' is not a valid HTTP method".into(),
                    suggestion: None,
                },
                ValidationError {
                    route: "b".into(),
                    field: "path".into(),
                    message: "path must start with '/'".into(),
                    suggestion: Some("did you mean '/b'?".into()),
                },
            ],
        };

        let rendered = err.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Config validation failed:");
        assert_eq!(
            lines[1],
            "  route /a: method: 'FETCH' is not a valid HTTP method"
        );
        assert_eq!(
            lines[2],
            "  route b: path: path must start with '/' (did you mean '/b'?)"
        );
    }

    #[test]
    fn timeout_message_reports_milliseconds() {
        let err = ForwardError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "backend did not respond within 1500ms");
    }
}
