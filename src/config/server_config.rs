//! Server configuration for Greenroom
//!
//! This module handles operator-configurable settings stored in settings.json.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::Paths;

static SERVER_CONFIG: OnceCell<Arc<RwLock<ServerConfig>>> = OnceCell::new();

/// Server configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Server ID used for the JWT secret and password salt
    #[serde(default)]
    pub server_id: String,

    /// Page size used when a list request omits pageSize
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Upper bound on pageSize; larger requests are clamped
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// Email for the bootstrap admin created on first run
    #[serde(default = "default_admin_email")]
    pub bootstrap_admin_email: String,

    /// Password for the bootstrap admin created on first run
    #[serde(default = "default_admin_password")]
    pub bootstrap_admin_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_id: String::new(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            bootstrap_admin_email: default_admin_email(),
            bootstrap_admin_password: default_admin_password(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let paths = Paths::get()?;
        let settings_path = paths.settings_path();

        if settings_path.exists() {
            let content =
                std::fs::read_to_string(&settings_path).context("Failed to read settings file")?;
            let mut config: ServerConfig =
                serde_json::from_str(&content).context("Failed to parse settings file")?;

            if config.server_id.is_empty() {
                config.server_id = uuid::Uuid::new_v4().to_string();
                config.save()?;
            }

            Ok(config)
        } else {
            let mut config = Self::default();
            config.server_id = uuid::Uuid::new_v4().to_string();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let paths = Paths::get()?;
        let settings_path = paths.settings_path();

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&settings_path, content).context("Failed to write settings file")?;

        Ok(())
    }

    /// Get the global config instance
    pub fn global() -> Arc<RwLock<ServerConfig>> {
        SERVER_CONFIG
            .get_or_init(|| {
                let config = ServerConfig::load().unwrap_or_default();
                Arc::new(RwLock::new(config))
            })
            .clone()
    }

    /// Clamp a requested page size to the configured bounds
    pub fn clamp_page_size(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(n) if n > 0 => n.min(self.max_page_size),
            _ => self.default_page_size,
        }
    }
}

// Default value functions for serde

fn default_page_size() -> i64 {
    25
}

fn default_max_page_size() -> i64 {
    200
}

fn default_admin_email() -> String {
    "admin@greenroom.local".to_string()
}

fn default_admin_password() -> String {
    "greenroom".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 200);
    }

    #[test]
    fn test_clamp_page_size() {
        let config = ServerConfig::default();
        assert_eq!(config.clamp_page_size(None), 25);
        assert_eq!(config.clamp_page_size(Some(0)), 25);
        assert_eq!(config.clamp_page_size(Some(-3)), 25);
        assert_eq!(config.clamp_page_size(Some(50)), 50);
        assert_eq!(config.clamp_page_size(Some(5000)), 200);
    }

    #[test]
    fn test_serialization() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.default_page_size, deserialized.default_page_size);
    }
}
