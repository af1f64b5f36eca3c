//! File-backed config sources.
//!
//! [`Format`] maps a file extension to its deserializer: JSON is always
//! built, YAML and TOML are gated by the `yaml` and `toml` features.
//! [`parse_config_str`] turns text of one format into a [`Config`], and
//! [`FileSource`](file_source::FileSource) feeds it a file read from disk.
//! Neither validates; that happens once, when the route table is built.

pub mod file_source;

use std::path::Path;

use crate::config::model::Config;
use crate::error::GatewayError;
use file_source::FileSource;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl Format {
    /// Look up the format for a file extension, if it is compiled in.
    pub fn from_extension(ext: &str) -> Result<Self, GatewayError> {
        match ext {
            "json" => Ok(Self::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(Self::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Ok(Self::Toml),
            other => Err(GatewayError::UnsupportedFormat(other.to_string())),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            #[cfg(feature = "yaml")]
            Self::Yaml => "yaml",
            #[cfg(feature = "toml")]
            Self::Toml => "toml",
        }
    }

    pub fn parse(self, content: &str) -> Result<Config, BoxError> {
        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| Box::new(e) as BoxError),
            #[cfg(feature = "yaml")]
            Self::Yaml => serde_yml::from_str(content).map_err(|e| Box::new(e) as BoxError),
            #[cfg(feature = "toml")]
            Self::Toml => toml::from_str(content).map_err(|e| Box::new(e) as BoxError),
        }
    }
}

/// Parse a config string, naming `path_display` in any error.
pub fn parse_config_str(
    format: Format,
    content: &str,
    path_display: &str,
) -> Result<Config, GatewayError> {
    format
        .parse(content)
        .map_err(|source| GatewayError::ConfigParse {
            path: path_display.to_string(),
            source,
        })
}

/// Pick the file source matching the extension of `path`.
pub fn for_path(path: &Path) -> Result<FileSource, GatewayError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = Format::from_extension(ext)?;
    Ok(FileSource::new(path.to_path_buf(), format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_always_supported() {
        assert_eq!(Format::from_extension("json").unwrap(), Format::Json);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Format::from_extension("xml").unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedFormat(ref f) if f == "xml"));
    }

    #[test]
    fn parse_error_names_the_file() {
        let err = parse_config_str(Format::Json, "{ nope", "gateway.json").unwrap_err();
        assert!(err.to_string().starts_with("Config parse error in gateway.json"));
    }

    #[test]
    fn negative_limit_is_a_parse_error() {
        let json = r#"{"routes": [{"path": "/a", "method": "GET",
            "target": {"host": "http://b"}, "limit": -1}]}"#;
        assert!(parse_config_str(Format::Json, json, "gateway.json").is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{"routes": [], "listen": 8080}"#;
        assert!(parse_config_str(Format::Json, json, "gateway.json").is_err());
    }
}
