//! Configuration management for pullreq
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PULLREQ_*)
//! 3. Config file (~/.config/pullreq/config.toml)
//! 4. Default values

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Deployment environment, which picks logging defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

impl Environment {
    pub fn default_level(&self) -> &'static str {
        match self {
            Environment::Local | Environment::Dev => "debug",
            Environment::Prod => "info",
        }
    }

    pub fn default_format(&self) -> LogFormat {
        match self {
            Environment::Local => LogFormat::Text,
            Environment::Dev | Environment::Prod => LogFormat::Json,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Environment::Local => "local",
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        };
        f.write_str(s)
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(Error::Config(format!("Unknown environment: {}", other))),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Requests running longer than this are answered with a timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SQLite database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let path = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pullreq")
            .join("pullreq.db");
        Self {
            path,
            max_connections: 5,
        }
    }
}

/// Logging overrides; unset fields follow the environment
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

/// Reviewer assignment settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum reviewers drawn for a new pull request
    pub reviewer_count: usize,

    /// Fixed RNG seed; absent or zero seeds from the clock
    pub random_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reviewer_count: 2,
            random_seed: None,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub env: Environment,
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub app: AppConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Returns `~/.config/pullreq/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pullreq").join("config.toml"))
    }

    /// Apply environment variable overrides from the process environment
    ///
    /// Supported variables:
    /// - PULLREQ_ENV: local, dev or prod
    /// - PULLREQ_PORT: HTTP port
    /// - PULLREQ_DATABASE_PATH: SQLite file
    /// - PULLREQ_REVIEWER_COUNT: reviewers per new pull request
    /// - PULLREQ_RANDOM_SEED: fixed selection seed
    /// - PULLREQ_LOG_LEVEL: log level override
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` in place of the process environment
    pub fn with_env_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("PULLREQ_ENV") {
            self.env = env.parse()?;
        }

        if let Some(port) = lookup("PULLREQ_PORT") {
            self.server.port = parse_var("PULLREQ_PORT", &port)?;
        }

        if let Some(path) = lookup("PULLREQ_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(count) = lookup("PULLREQ_REVIEWER_COUNT") {
            self.app.reviewer_count = parse_var("PULLREQ_REVIEWER_COUNT", &count)?;
        }

        if let Some(seed) = lookup("PULLREQ_RANDOM_SEED") {
            self.app.random_seed = Some(parse_var("PULLREQ_RANDOM_SEED", &seed)?);
        }

        if let Some(level) = lookup("PULLREQ_LOG_LEVEL") {
            self.logging.level = Some(level);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, database: Option<PathBuf>, port: Option<u16>) -> Self {
        if let Some(path) = database {
            self.database.path = path;
        }

        if let Some(port) = port {
            self.server.port = port;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        database: Option<PathBuf>,
        port: Option<u16>,
    ) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        Ok(base
            .with_env_overrides()?
            .with_cli_overrides(database, port))
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .unwrap_or_else(|| self.env.default_level())
    }

    /// Effective log format
    pub fn log_format(&self) -> LogFormat {
        self.logging
            .format
            .unwrap_or_else(|| self.env.default_format())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.env, Environment::Local);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert_eq!(config.app.reviewer_count, 2);
        assert!(config.app.random_seed.is_none());
        assert!(config.database.path.ends_with("pullreq/pullreq.db"));
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_format(), LogFormat::Text);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
env = "prod"

[server]
port = 9000
request_timeout = "5s"

[database]
path = "/var/lib/pullreq/pullreq.db"
max_connections = 10

[app]
reviewer_count = 3
random_seed = 42
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.env, Environment::Prod);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.request_timeout, Duration::from_secs(5));
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.app.reviewer_count, 3);
        assert_eq!(config.app.random_seed, Some(42));
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_logging_overrides_environment() {
        let toml = r#"
env = "dev"

[logging]
level = "warn"
format = "text"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.log_format(), LogFormat::Text);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PULLREQ_ENV", "PROD"),
            ("PULLREQ_PORT", "3000"),
            ("PULLREQ_REVIEWER_COUNT", "1"),
            ("PULLREQ_RANDOM_SEED", "7"),
            ("PULLREQ_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_env_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.env, Environment::Prod);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.app.reviewer_count, 1);
        assert_eq!(config.app.random_seed, Some(7));
        assert_eq!(config.log_level(), "trace");
    }

    #[test]
    fn test_invalid_env_override() {
        let err = Config::default()
            .with_env_overrides_from(|key| (key == "PULLREQ_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("PULLREQ_PORT")));

        let err = Config::default()
            .with_env_overrides_from(|key| (key == "PULLREQ_ENV").then(|| "staging".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default()
            .with_cli_overrides(Some(PathBuf::from("/tmp/test.db")), Some(9999));
        assert_eq!(config.database.path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[app]\nreviewer_count = 4\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.app.reviewer_count, 4);

        std::fs::write(&path, "[app\n").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
