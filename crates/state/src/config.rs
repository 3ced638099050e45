//! Environment configuration via `tether.toml`
//!
//! A default `tether.toml` is written next to the state snapshot on first
//! use. To change settings, edit the file; every command re-reads it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tether_concurrency::RetryConfig;
use tether_core::{TetherError, TetherResult};
use uuid::Uuid;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "tether.toml";

/// Store snapshot file name inside `data_dir`.
pub const SNAPSHOT_FILE_NAME: &str = "state.json";

/// API client settings, the `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Upper bound on a single facade call in milliseconds (default: 30000)
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

/// Configuration loaded from `tether.toml`.
///
/// # Example
///
/// ```toml
/// environment = "5f1b7c2e-3a7d-4c53-8d0e-0e6f1f3d9a11"
/// data_dir = ".tether"
///
/// [txn]
/// max_retries = 3
///
/// [api]
/// call_timeout_ms = 30000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TetherConfig {
    /// Environment UUID; every document id is scoped to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Directory holding the store snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Transaction retry policy.
    #[serde(default)]
    pub txn: RetryConfig,
    /// API client settings.
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".tether")
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            environment: None,
            data_dir: default_data_dir(),
            txn: RetryConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl TetherConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Tether configuration
#
# Environment UUID; generated on first run when absent.
# environment = "..."

# Directory holding the state snapshot (state.json).
data_dir = ".tether"

# Retry policy for transactions that lose a race with a concurrent writer.
[txn]
max_retries = 3
base_delay_ms = 10
max_delay_ms = 100

[api]
# Upper bound on a single facade call.
call_timeout_ms = 30000
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if
    /// `environment` is not a UUID.
    pub fn from_file(path: &Path) -> TetherResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TetherError::internal(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: TetherConfig = toml::from_str(&content).map_err(|e| {
            TetherError::invalid_input(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.environment_uuid()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> TetherResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                TetherError::internal(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> TetherResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TetherError::internal(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            TetherError::internal(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Parsed environment UUID, `None` when not yet assigned.
    pub fn environment_uuid(&self) -> TetherResult<Option<Uuid>> {
        match &self.environment {
            None => Ok(None),
            Some(s) => Uuid::parse_str(s).map(Some).map_err(|_| {
                TetherError::invalid_input(format!("environment {:?} is not a valid UUID", s))
            }),
        }
    }

    /// Retry policy for the transaction runner.
    pub fn retry_config(&self) -> RetryConfig {
        self.txn.clone()
    }

    /// Upper bound on a single facade call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.api.call_timeout_ms)
    }

    /// Path of the store snapshot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_toml_parses_to_defaults() {
        let config: TetherConfig = toml::from_str(TetherConfig::default_toml()).unwrap();
        assert_eq!(config, TetherConfig::default());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        TetherConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = TetherConfig::from_file(&path).unwrap();
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.environment_uuid().unwrap(), None);
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[txn]\nmax_retries = 9\n").unwrap();

        TetherConfig::write_default_if_missing(&path).unwrap();

        let config = TetherConfig::from_file(&path).unwrap();
        assert_eq!(config.retry_config().max_retries, 9);
        assert_eq!(config.retry_config().base_delay_ms, 10);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let config = TetherConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".tether"));
        assert_eq!(config.snapshot_path(), PathBuf::from(".tether").join("state.json"));
    }

    #[test]
    fn invalid_environment_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "environment = \"not-a-uuid\"\n").unwrap();

        let err = TetherConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, TetherError::InvalidInput { .. }));
    }

    #[test]
    fn round_trip_with_environment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let env = Uuid::new_v4();
        let config = TetherConfig {
            environment: Some(env.to_string()),
            api: ApiConfig { call_timeout_ms: 500 },
            ..TetherConfig::default()
        };

        config.write_to_file(&path).unwrap();
        let parsed = TetherConfig::from_file(&path).unwrap();

        assert_eq!(parsed, config);
        assert_eq!(parsed.environment_uuid().unwrap(), Some(env));
        assert_eq!(parsed.call_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(TetherConfig::from_file(&dir.path().join("nope.toml")).is_err());
    }
}
