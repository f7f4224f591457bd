use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLUSTER_NAME, DEFAULT_NODE_VERSION_PATH, DEFAULT_PROVIDER, DEFAULT_REMOTE_LOG_DIR,
};

/// Settings for a collection run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// Cluster whose nodes are discovered when none are listed explicitly
    pub cluster: String,
    /// Container runtime binary used to reach nodes (`docker`, `podman`)
    pub provider: String,
    /// Directory mirrored from every node
    pub remote_log_dir: String,
    /// Version marker read from every node
    pub version_file: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            cluster: DEFAULT_CLUSTER_NAME.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            remote_log_dir: DEFAULT_REMOTE_LOG_DIR.to_string(),
            version_file: DEFAULT_NODE_VERSION_PATH.to_string(),
        }
    }
}

impl CollectionConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: CollectionConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML config")?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }
}

/// Load the configuration at `path`, writing the defaults there first if the
/// file does not exist yet. Without a path the defaults are used as-is.
pub fn load_or_create_config(path: Option<&Path>) -> Result<CollectionConfig> {
    match path {
        Some(path) if path.exists() => CollectionConfig::from_yaml_file(path),
        Some(path) => {
            info!("Config file {} not found, creating default", path.display());
            let config = CollectionConfig::default();
            config.save_to_yaml_file(path)?;
            Ok(config)
        }
        None => Ok(CollectionConfig::default()),
    }
}
