//! Async file-backed config source with SHA-256 change detection.
//!
//! [`FileSource`] implements [`ConfigSource`] for any file format by
//! taking a deserialization function at construction time. Each load
//! reads the file through Tokio, validates the parsed [`Config`], and
//! hashes the raw bytes so the refresh loop can tell when it changed.

use std::path::PathBuf;

use async_trait::async_trait;

use super::sha256_hex;
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::GatewayError;

type Deserialize = fn(&str) -> Result<Config, Box<dyn std::error::Error + Send + Sync>>;

pub struct FileSource {
    path: PathBuf,
    name: &'static str,
    deserialize: Deserialize,
}

impl FileSource {
    #[must_use]
    pub fn new(path: PathBuf, name: &'static str, deserialize: Deserialize) -> Self {
        Self {
            path,
            name,
            deserialize,
        }
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
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn load(&self) -> Result<(Config, ConfigVersion), GatewayError> {
        let content = self.read_content().await?;

        let config = (self.deserialize)(&content).map_err(|e| GatewayError::ConfigParse {
            path: self.path.display().to_string(),
            source: e,
        })?;

        validate(&config).map_err(|errors| GatewayError::ConfigValidation { errors })?;

        let hash = sha256_hex(content.as_bytes());
        tracing::debug!(path = %self.path.display(), version = %&hash[..8], "config file loaded");
        Ok((config, ConfigVersion::Hash(hash)))
    }

    async fn has_changed(&self, current: &ConfigVersion) -> Result<bool, GatewayError> {
        let content = self.read_content().await?;
        let hash = sha256_hex(content.as_bytes());
        Ok(*current != ConfigVersion::Hash(hash))
    }
}
