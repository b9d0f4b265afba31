//! Configuration loading

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use portal_auth::{LockoutPolicy, MarkerMode};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides, e.g. `PORTAL__SERVER__PORT`
const ENV_PREFIX: &str = "PORTAL";

/// Marker secret shipped in the sample configuration
pub const DEFAULT_MARKER_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file, created if missing
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub marker: MarkerMode,
    #[serde(default = "default_marker_secret")]
    pub marker_secret: String,
    /// Add `Secure` to the role cookie
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub trust_peer_address: bool,
    #[serde(default)]
    pub lockout: LockoutConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            marker: MarkerMode::default(),
            marker_secret: default_marker_secret(),
            cookie_secure: false,
            trust_peer_address: false,
            lockout: LockoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            window_secs: default_window_secs(),
        }
    }
}

impl LockoutConfig {
    pub fn policy(&self) -> Result<LockoutPolicy> {
        let secs = i64::try_from(self.window_secs).context("Lockout window is too large")?;
        let window = chrono::Duration::try_seconds(secs).context("Lockout window is too large")?;
        Ok(LockoutPolicy {
            max_attempts: self.max_attempts,
            window,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "./data/portal.db".to_string()
}

fn default_marker_secret() -> String {
    DEFAULT_MARKER_SECRET.to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file layered with environment overrides.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            info!("Loading configuration from {}", path);
        } else {
            info!("Config file not found at {}, using defaults", path);
        }

        let config = config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration: {}", path))?;

        config
            .try_deserialize()
            .with_context(|| format!("Failed to parse configuration: {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.database.path, "./data/portal.db");
        assert_eq!(config.auth.marker, MarkerMode::Plain);
        assert!(!config.auth.trust_peer_address);
        assert_eq!(config.auth.lockout.max_attempts, 5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[auth]
marker = "signed"
marker_secret = "s3cret"

[auth.lockout]
window_secs = 60

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.auth.marker, MarkerMode::Signed);
        assert_eq!(config.auth.marker_secret, "s3cret");
        assert_eq!(config.auth.lockout.max_attempts, 5);
        assert_eq!(config.auth.lockout.window_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[auth]\nmarker = \"encrypted\"").unwrap();

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_lockout_policy_from_config() {
        let policy = LockoutConfig {
            max_attempts: 3,
            window_secs: 120,
        }
        .policy()
        .unwrap();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.window, chrono::Duration::minutes(2));
    }

    #[test]
    fn test_database_url() {
        let db = DatabaseConfig {
            path: "/var/lib/portal/portal.db".to_string(),
        };
        assert_eq!(db.url(), "sqlite:/var/lib/portal/portal.db?mode=rwc");
    }
}
