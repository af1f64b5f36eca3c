//! Async file-based config source.
//!
//! [`FileSource`] reads a file of one [`Format`] asynchronously via Tokio
//! and deserializes it. Validation is left to the caller.

use std::path::{Path, PathBuf};

use super::{parse_config_str, Format};
use crate::config::model::Config;
use crate::error::GatewayError;

pub struct FileSource {
    path: PathBuf,
    format: Format,
}

impl FileSource {
    #[must_use]
    pub const fn new(path: PathBuf, format: Format) -> Self {
        Self { path, format }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.format.name()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_content(&self) -> Result<String, GatewayError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GatewayError::ConfigFileNotFound {
                    path: self.path.clone(),
                }
            } else {
                GatewayError::Io(e)
            }
        })
    }

    /// Read and deserialize without validating.
    pub async fn parse(&self) -> Result<Config, GatewayError> {
        let content = self.read_content().await?;
        parse_config_str(self.format, &content, &self.path.display().to_string())
    }
}
