//! Configuration loading, validation, and hot-reloading.
//!
//! Defines the [`ConfigSource`] trait for pluggable config sources and the
//! [`ConfigVersion`] enum for change detection. When no config file is
//! present the gateway runs on [`BuiltinSource`], whose values match the
//! stock deployment. Submodules provide the data model, validation logic,
//! and the file-backed sources.

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::GatewayError;
use model::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Builtin,
    Hash(String),
}

impl ConfigVersion {
    /// Short form suitable for logs and the health endpoint.
    #[must_use]
    pub fn short(&self) -> String {
        match self {
            Self::Builtin => "builtin".to_string(),
            Self::Hash(h) => h.get(..8).unwrap_or(h).to_string(),
        }
    }
}

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<(Config, ConfigVersion), GatewayError>;
    async fn has_changed(&self, current: &ConfigVersion) -> Result<bool, GatewayError>;
}

/// Compiled-in defaults. Never changes, so the refresh loop is a no-op.
#[derive(Debug, Default)]
pub struct BuiltinSource;

#[async_trait]
impl ConfigSource for BuiltinSource {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn load(&self) -> Result<(Config, ConfigVersion), GatewayError> {
        Ok((Config::default(), ConfigVersion::Builtin))
    }

    async fn has_changed(&self, _current: &ConfigVersion) -> Result<bool, GatewayError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_version_truncates_hash() {
        let v = ConfigVersion::Hash("0123456789abcdef".into());
        assert_eq!(v.short(), "01234567");
        assert_eq!(ConfigVersion::Hash("abc".into()).short(), "abc");
        assert_eq!(ConfigVersion::Builtin.short(), "builtin");
    }

    #[tokio::test]
    async fn builtin_source_never_changes() {
        let source = BuiltinSource;
        let (config, version) = source.load().await.unwrap();
        assert_eq!(version, ConfigVersion::Builtin);
        assert_eq!(config.cockpit.prefix, "/api/cockpit");
        assert!(!source.has_changed(&version).await.unwrap());
    }
}
