//! Configuration loading — YAML file on disk into an immutable `FleetConfig`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::config::FleetConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "APPFLEET_CONFIG";

/// Reads `FleetConfig` from `$APPFLEET_CONFIG` or `~/.appfleet/config.yaml`.
pub struct YamlConfigStore;

impl YamlConfigStore {
    /// Load the config; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if its port range is unusable.
    pub fn load(&self) -> Result<FleetConfig> {
        let path = self.path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(FleetConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: FleetConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        config
            .ports
            .validate()
            .with_context(|| format!("invalid ports in {}", path.display()))?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if no override is set and the home directory cannot
    /// be determined.
    pub fn path(&self) -> Result<PathBuf> {
        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".appfleet").join("config.yaml"))
    }
}
