use anyhow::{Context, Result};
use ghbridge_core::{GatewayConfig, GatewaySettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of the optional TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
}

impl ServerConfig {
    /// Load the configuration file, or defaults when it does not exist
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                "Configuration file {} not found, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read configuration file")?;
        toml::from_str(&content).context("Failed to parse configuration file")
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::from(self.gateway.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&temp_dir.path().join("ghbridge.toml")).unwrap();

        assert_eq!(config.gateway_config(), GatewayConfig::default());
    }

    #[test]
    fn test_load_gateway_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ghbridge.toml");
        std::fs::write(
            &path,
            "[gateway]\ngh_path = \"/usr/local/bin/gh\"\ntimeout_secs = 10\n",
        )
        .unwrap();

        let gateway = ServerConfig::load(&path).unwrap().gateway_config();
        assert_eq!(gateway.gh_path, PathBuf::from("/usr/local/bin/gh"));
        assert_eq!(gateway.timeout, Duration::from_secs(10));
        assert_eq!(gateway.max_output_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ghbridge.toml");
        std::fs::write(&path, "[gateway]\ntimeout_secs = \"soon\"\n").unwrap();

        let err = ServerConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse configuration file"));
    }
}
