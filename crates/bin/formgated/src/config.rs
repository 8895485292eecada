//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `formgate.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use formgate_app::engine::HostInfo;
use formgate_app::scheduler::SchedulerConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault location.
    pub vault: VaultConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Auto-trigger scheduler timing.
    pub scheduler: SchedulerSection,
    /// Script host limits.
    pub scripts: ScriptsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Versions reported to `system` conditions.
    pub host: HostConfig,
}

/// Vault configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Directory holding notes and `*.form.json` files.
    pub root: PathBuf,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Scheduler configuration, in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Run the auto-trigger loop and the file watcher.
    pub enabled: bool,
    pub tick_interval_secs: u64,
    pub initial_delay_secs: u64,
    pub min_cooldown_secs: u64,
}

/// Script host configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Maximum run time of one script condition.
    pub timeout_ms: u64,
    /// Maximum nesting depth of an expression.
    pub max_depth: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Host application versions.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub version: String,
}

impl Config {
    /// Load configuration from `formgate.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("FORMGATE_CONFIG").unwrap_or_else(|_| "formgate.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FORMGATE_VAULT") {
            self.vault.root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("FORMGATE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("FORMGATE_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("FORMGATE_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("FORMGATE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.vault.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "vault root must not be empty".to_string(),
            ));
        }
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler tick interval must be non-zero".to_string(),
            ));
        }
        if self.scripts.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "script timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_secs(self.scheduler.tick_interval_secs),
            initial_delay: Duration::from_secs(self.scheduler.initial_delay_secs),
            min_cooldown: Duration::from_secs(self.scheduler.min_cooldown_secs),
        }
    }

    #[must_use]
    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.scripts.timeout_ms)
    }

    #[must_use]
    pub fn host_info(&self) -> HostInfo {
        HostInfo {
            host_version: self.host.version.clone(),
            ..HostInfo::default()
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        let defaults = SchedulerConfig::default();
        Self {
            enabled: true,
            tick_interval_secs: defaults.tick_interval.as_secs(),
            initial_delay_secs: defaults.initial_delay.as_secs(),
            min_cooldown_secs: defaults.min_cooldown.as_secs(),
        }
    }
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_depth: formgate_adapter_script_expr::DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "formgated=info,formgate=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: HostInfo::default().host_version,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.vault.root, PathBuf::from("."));
        assert_eq!(config.server.port, 3000);
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler_config(), SchedulerConfig::default());
        assert_eq!(config.script_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [vault]
            root = '/srv/notes'

            [server]
            host = '0.0.0.0'
            port = 9090

            [scheduler]
            enabled = false
            tick_interval_secs = 30
            initial_delay_secs = 1
            min_cooldown_secs = 120

            [scripts]
            timeout_ms = 250
            max_depth = 16

            [logging]
            filter = 'debug'

            [host]
            version = '1.5.3'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.vault.root, PathBuf::from("/srv/notes"));
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
        assert!(!config.scheduler.enabled);
        assert_eq!(
            config.scheduler_config().min_cooldown,
            Duration::from_secs(120)
        );
        assert_eq!(config.script_timeout(), Duration::from_millis(250));
        assert_eq!(config.scripts.max_depth, 16);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.host_info().host_version, "1.5.3");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.scheduler.tick_interval_secs, 60);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_invalid_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scripts.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.vault.root = PathBuf::new();
        assert!(config.validate().is_err());
    }
}
