//! Configuration loading and validation.
//!
//! The config is read once at startup. [`locate`] resolves an explicit path
//! or auto-detects a `gateway.*` file in the working directory, and
//! [`load`] parses it. Validation runs when the route table is compiled
//! from the result. Submodules provide the data model,
//! validation logic and the file sources.

pub mod model;
pub mod sources;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::GatewayError;
use model::Config;

const CANDIDATES: &[&str] = &[
    "gateway.json",
    "gateway.yaml",
    "gateway.yml",
    "gateway.toml",
];

/// Resolve the config file to load: `explicit` if given, else the first
/// existing candidate in the current directory.
pub async fn locate(explicit: Option<&Path>) -> Result<PathBuf, GatewayError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    for name in CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Ok(path);
        }
    }

    Err(GatewayError::NoConfigSource {
        hint: "Provide --config <file> or create ./gateway.json.".into(),
    })
}

/// Parse the config at `path`.
pub async fn load(path: &Path) -> Result<Config, GatewayError> {
    let source = sources::for_path(path)?;
    let config = source.parse().await?;
    tracing::debug!(
        path = %source.path().display(),
        format = source.name(),
        routes = config.routes.len(),
        "config loaded"
    );
    Ok(config)
}
