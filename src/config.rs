//! Configuration manager for the account service.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:5001";
const DEFAULT_TIMEOUT: u64 = 5;
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that may occur during the configuration loading process.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot open `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(#[from] serde_yaml::Error),
}

/// Runtime flavour, drives logging defaults.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    #[serde(alias = "dev")]
    Development,
    #[serde(alias = "prod")]
    Production,
}

impl Mode {
    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> &'static str {
        match self {
            Mode::Development => "debug",
            Mode::Production => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Socket address to listen on.
    pub address: String,
    pub mode: Mode,
    /// Request-scoped timeout, in seconds.
    pub timeout: u64,
    #[serde(skip_deserializing)]
    pub version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to telemetry export.
    #[serde(skip_serializing)]
    pub telemetry: Option<Telemetry>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_CRATE_NAME").to_owned(),
            address: DEFAULT_ADDRESS.to_owned(),
            mode: Mode::default(),
            timeout: DEFAULT_TIMEOUT,
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            postgres: None,
            telemetry: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// OpenTelemetry configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// gRPC endpoint of the OTLP collector.
    pub otlp_endpoint: Option<String>,
}

impl Configuration {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Request-scoped timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Reads the configuration file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Self, ConfigError> {
        let file_path = if self.path.as_os_str().is_empty() {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        } else {
            self.path.clone()
        };

        let file = File::open(&file_path).map_err(|source| ConfigError::Io {
            path: file_path.clone(),
            source,
        })?;

        let mut config: Configuration = serde_yaml::from_reader(file)?;
        config.version = VERSION.to_owned();
        config.path = file_path;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let config: Configuration = serde_yaml::from_str(
            r#"
name: accounts-eu
address: 127.0.0.1:6000
mode: prod
timeout: 2
postgres:
  address: localhost:5432
  database: accounts
  pool_size: 4
telemetry:
  otlp_endpoint: http://localhost:4317
"#,
        )
        .unwrap();

        assert_eq!(config.name, "accounts-eu");
        assert_eq!(config.address, "127.0.0.1:6000");
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        let postgres = config.postgres.unwrap();
        assert_eq!(postgres.database.as_deref(), Some("accounts"));
        assert_eq!(postgres.pool_size, Some(4));
        assert!(postgres.username.is_none());
        assert_eq!(
            config.telemetry.unwrap().otlp_endpoint.as_deref(),
            Some("http://localhost:4317")
        );
    }

    #[test]
    fn test_defaults() {
        let config: Configuration = serde_yaml::from_str("name: accounts").unwrap();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.postgres.is_none());
        assert_eq!(Mode::Development.default_directive(), "debug");
    }

    #[test]
    fn test_missing_file() {
        let result = Configuration::default()
            .path("does/not/exist.yaml")
            .read();

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
