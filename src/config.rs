//! Configuration loaded from TOML.
//!
//! ```toml
//! default_page_size = 20
//! max_page_size = 2500
//! snapshot_url_template = "http://orkg.org/resources/{id}/snapshots/{snapshotId}"
//! handle_prefix = "20.500.12345"
//!
//! [backend]
//! kind = "memory"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::paging::{PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::storage::BackendConfig;
use crate::{Error, Result};

pub const DEFAULT_SNAPSHOT_URL_TEMPLATE: &str =
    "http://orkg.org/resources/{id}/snapshots/{snapshotId}";

#[derive(Debug, Clone, PartialEq)]
pub struct OrkgConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Target URL of snapshot handles; `{id}` and `{snapshotId}` are substituted.
    pub snapshot_url_template: String,
    /// Handle prefix. Snapshots get no handle when unset.
    pub handle_prefix: Option<String>,
    pub backend: BackendConfig,
}

impl Default for OrkgConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            snapshot_url_template: DEFAULT_SNAPSHOT_URL_TEMPLATE.to_string(),
            handle_prefix: None,
            backend: BackendConfig::Memory,
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    default_page_size: Option<usize>,
    max_page_size: Option<usize>,
    snapshot_url_template: Option<String>,
    handle_prefix: Option<String>,
    backend: Option<BackendConfig>,
}

impl OrkgConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        Self::from_config_file(file)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();
        if let Some(max) = file.max_page_size {
            if max == 0 {
                return Err(Error::Config("max_page_size must be positive".into()));
            }
            config.max_page_size = max;
        }
        if let Some(size) = file.default_page_size {
            config.default_page_size = size;
        }
        if config.default_page_size == 0 || config.default_page_size > config.max_page_size {
            return Err(Error::Config(format!(
                "default_page_size must be between 1 and {}",
                config.max_page_size
            )));
        }
        if let Some(template) = file.snapshot_url_template {
            config.snapshot_url_template = template;
        }
        config.handle_prefix = file.handle_prefix.filter(|p| !p.trim().is_empty());
        if let Some(backend) = file.backend {
            config.backend = backend;
        }
        Ok(config)
    }

    /// Apply the configured size defaults and limits to a request.
    pub fn page(&self, request: PageRequest) -> PageRequest {
        request.clamped(self.default_page_size, self.max_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(OrkgConfig::from_toml_str("").unwrap(), OrkgConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = OrkgConfig::from_toml_str(
            r#"
            default_page_size = 50
            max_page_size = 100
            handle_prefix = "20.500.12345"

            [backend]
            kind = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.handle_prefix.as_deref(), Some("20.500.12345"));
        assert_eq!(config.page(PageRequest::of(0, 1000)).size, 100);
        assert_eq!(config.page(PageRequest::of(0, 0)).size, 50);
    }

    #[test]
    fn test_invalid_config() {
        let err = OrkgConfig::from_toml_str("default_page_size = 5000").unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(OrkgConfig::from_toml_str("max_page_size = 0").is_err());
        assert!(OrkgConfig::from_toml_str("unknown_key = 1").is_err());
        assert!(OrkgConfig::from_toml_str("default_page_size = \"many\"").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = OrkgConfig::load(Path::new("/nonexistent/orkg.toml")).unwrap();
        assert_eq!(config, OrkgConfig::default());
    }
}
