//! Configuration management for the sandboxed file server
//!
//! Everything here is startup configuration: it is read once, validated, and
//! never changes for the lifetime of the process.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Prefix of every environment override, e.g. `MCP_FILE_SYSTEM_BASE_DIR`
pub const ENV_PREFIX: &str = "MCP_FILE_SYSTEM";

/// Names an explicit config file instead of `./config.toml`
pub const CONFIG_FILE_VAR: &str = "MCP_FILE_SYSTEM_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config";

/// How requests reach the server
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Newline-delimited JSON over TCP connections
    Tcp,
    /// A single session over stdin/stdout
    Stdio,
}

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Root directory for all file operations
    /// Environment: MCP_FILE_SYSTEM_BASE_DIR
    pub base_dir: String,

    pub transport: Transport,

    /// IP address to bind (tcp transport only)
    pub bind_address: String,

    /// Port to bind (tcp transport only)
    pub port: u16,

    /// Maximum concurrent connections
    pub max_clients: usize,

    /// Longest accepted request line in bytes
    pub max_request_length: usize,
}

impl ServerConfig {
    /// Load configuration: defaults, then config file, then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let config_file =
            std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&config_file, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an optional config file and the given environment source
    pub fn load_from(config_file: &str, environment: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("base_dir", default_base_dir())?
            .set_default("transport", "tcp")?
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("max_clients", 64_i64)?
            .set_default("max_request_length", 16_i64 * 1024 * 1024)?
            .add_source(File::with_name(config_file).required(false))
            .add_source(environment)
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.trim().is_empty() {
            return Err(ConfigError::Message("base_dir cannot be empty".into()));
        }

        if self.transport == Transport::Tcp && self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_request_length == 0 {
            return Err(ConfigError::Message(
                "max_request_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get base directory as PathBuf
    pub fn base_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.base_dir)
    }
}

/// `<temp dir>/mcp_file_system`
fn default_base_dir() -> String {
    std::env::temp_dir()
        .join("mcp_file_system")
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // A prefix no test environment sets, so only defaults and files apply.
    fn isolated_env() -> Environment {
        Environment::with_prefix("SANDBOX_FS_TEST_UNSET_PREFIX")
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let config = ServerConfig::load_from(&missing.to_string_lossy(), isolated_env()).unwrap();

        assert_eq!(config.transport, Transport::Tcp);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_clients, 64);
        assert_eq!(config.listen_socket(), "0.0.0.0:8000");
        assert!(config.base_dir.ends_with("mcp_file_system"));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("server.toml");
        std::fs::write(
            &file,
            "base_dir = \"/srv/files\"\ntransport = \"stdio\"\nport = 9100\n",
        )
        .unwrap();

        let config = ServerConfig::load_from(&file.to_string_lossy(), isolated_env()).unwrap();
        assert_eq!(config.base_dir_path(), PathBuf::from("/srv/files"));
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.port, 9100);
        assert_eq!(config.max_clients, 64);
    }

    #[test]
    fn test_validation_rejects_zero_clients() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.toml");
        std::fs::write(&file, "max_clients = 0\n").unwrap();

        let err = ServerConfig::load_from(&file.to_string_lossy(), isolated_env()).unwrap_err();
        assert!(err.to_string().contains("max_clients"));
    }
}
