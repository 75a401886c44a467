//! Persistent client defaults.
//!
//! Stored as `config.toml` under the user configuration directory. Only
//! the relay address and the daily-key seed are persisted; passphrases are
//! always typed interactively and never written to disk.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Client defaults loaded at startup and written by `connect --save`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Default relay address for `connect`.
    pub relay_addr: Option<String>,
    /// Default seed for the rotating daily key.
    pub seed: Option<String>,
}

impl AppConfig {
    /// Load the configuration, falling back to defaults if no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save the configuration, creating the directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Path of the config file.
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("blindrelay").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        let config = AppConfig::default();
        assert!(config.relay_addr.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: AppConfig = toml::from_str("relay_addr = \"10.0.0.5:8000\"\n").unwrap();
        assert_eq!(config.relay_addr.as_deref(), Some("10.0.0.5:8000"));
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = AppConfig {
            relay_addr: Some("relay.example.org:8000".to_string()),
            seed: Some("team-seed".to_string()),
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.relay_addr.as_deref(), Some("relay.example.org:8000"));
        assert_eq!(parsed.seed.as_deref(), Some("team-seed"));
    }
}
