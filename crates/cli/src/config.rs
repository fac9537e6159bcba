use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// File name looked up in the working directory.
const LOCAL_CONFIG_FILE: &str = "flyingpig.toml";

/// Chat server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server root; endpoints live under `<base_url>/api/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Interactive client behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Username suggested by `/login` when none is typed.
    #[serde(default)]
    pub username: Option<String>,

    /// Check for an existing server session on startup.
    #[serde(default = "default_true")]
    pub auto_restore: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: None,
            auto_restore: true,
        }
    }
}

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads config from `path`, else `./flyingpig.toml`, else
    /// `~/.flyingpig/config.toml`, else defaults; then applies env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let cwd = std::env::current_dir().ok()?.join(LOCAL_CONFIG_FILE);
            if cwd.exists() {
                return Some(cwd);
            }
            let home_config = Self::home_path()?;
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        debug!(
            base_url = %config.server.base_url,
            timeout_secs = config.server.timeout_secs,
            auto_restore = config.client.auto_restore,
            "Config loaded"
        );
        Ok(config)
    }

    /// `~/.flyingpig/config.toml`, when `HOME` is set.
    pub fn home_path() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".flyingpig").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("FLYINGPIG_SERVER_URL") {
            self.server.base_url = url;
        }
        if let Ok(raw) = std::env::var("FLYINGPIG_TIMEOUT_SECS") {
            self.server.timeout_secs =
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        field: "FLYINGPIG_TIMEOUT_SECS".to_string(),
                        reason: e.to_string(),
                    })?;
        }
        if let Ok(user) = std::env::var("FLYINGPIG_USERNAME")
            && !user.trim().is_empty()
        {
            self.client.username = Some(user.trim().to_string());
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.server.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingField("server.base_url".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".to_string(),
                reason: format!("'{url}' must start with http:// or https://"),
            });
        }
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
