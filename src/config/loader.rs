use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::types::Config;

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "loading configuration");

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(yaml).context("failed to parse YAML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.broker.address == self.api.address {
            anyhow::bail!(
                "broker and api endpoints must not share an address: {}",
                self.broker.address
            );
        }

        if self.broker.max_line_bytes == 0 {
            anyhow::bail!("broker.max_line_bytes must be greater than zero");
        }

        info!("configuration validated successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.broker.address, "127.0.0.1:5555".parse().unwrap());
        assert_eq!(config.api.address, "127.0.0.1:8001".parse().unwrap());
        assert_eq!(config.settings.log_level, "info");
        assert!(!config.settings.json_logs);
        assert_eq!(
            config.settings.shutdown.drain_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
broker:
  address: "0.0.0.0:6000"
  max_line_bytes: 1024

api:
  address: "0.0.0.0:8080"

settings:
  log_level: debug
  json_logs: true
  shutdown:
    drain_timeout: 45s
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.broker.address, "0.0.0.0:6000".parse().unwrap());
        assert_eq!(config.broker.max_line_bytes, 1024);
        assert_eq!(config.api.address, "0.0.0.0:8080".parse().unwrap());
        assert!(config.settings.json_logs);
        assert_eq!(
            config.settings.shutdown.drain_timeout,
            Duration::from_secs(45)
        );
    }

    #[test]
    fn test_shared_address_rejected() {
        let yaml = r#"
broker:
  address: "127.0.0.1:7000"
api:
  address: "127.0.0.1:7000"
"#;

        let result = Config::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must not share an address"));
    }

    #[test]
    fn test_zero_line_limit_rejected() {
        let yaml = r#"
broker:
  max_line_bytes: 0
"#;

        let result = Config::from_yaml(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_duration() {
        let yaml = r#"
settings:
  shutdown:
    drain_timeout: "not a duration"
"#;

        assert!(Config::from_yaml(yaml).is_err());
    }
}
