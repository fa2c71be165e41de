//! Console configuration management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A USB/IP server offered in the remote view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHostConfig {
    /// Display name (e.g., "lab-pi")
    pub name: String,
    /// Host name or IP address
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub console: ConsoleSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub remote_hosts: Vec<RemoteHostConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleSettings {
    pub log_level: String,
    /// Where to write logs; the TUI falls back to a file in the cache dir
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// How long a toast stays on screen
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
    /// Delay between a successful action and the list refresh
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
    /// Number of log records fetched for the log view
    #[serde(default = "default_log_limit")]
    pub log_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_notification_ttl_ms() -> u64 {
    5000
}

fn default_refresh_delay_ms() -> u64 {
    1000
}

fn default_log_limit() -> u32 {
    200
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            console: ConsoleSettings {
                log_level: "info".to_string(),
                log_file: None,
                notification_ttl_ms: default_notification_ttl_ms(),
                refresh_delay_ms: default_refresh_delay_ms(),
                log_limit: default_log_limit(),
            },
            backend: BackendSettings {
                base_url: "http://127.0.0.1:5000".to_string(),
                timeout_secs: default_timeout_secs(),
                username: None,
                password: None,
            },
            remote_hosts: Vec::new(),
        }
    }
}

impl ConsoleConfig {
    /// Credentials to log in with, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.backend.username, &self.backend.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.console.notification_ttl_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.console.refresh_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Log file with `~` expanded
    pub fn log_file(&self) -> Option<PathBuf> {
        self.console
            .log_file
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
    }

    /// Log file used while the TUI owns the terminal
    pub fn tui_log_file(&self) -> PathBuf {
        self.log_file().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("usbip-console")
                .join("console.log")
        })
    }

    /// Find a saved remote host by name (case-insensitive)
    pub fn find_remote_host(&self, name: &str) -> Option<&RemoteHostConfig> {
        self.remote_hosts
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }
}

impl ConsoleConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            expand_path(&p.to_string_lossy())
        } else {
            // Try standard locations in order
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/usbip-console/console.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ConsoleConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        tracing::debug!(
            "Config: backend={}, {} remote hosts",
            config.backend.base_url,
            config.remote_hosts.len()
        );
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                // Print to stderr since logging might not be initialized yet
                eprintln!("Config: {:#}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usbip-console").join("console.toml")
        } else {
            PathBuf::from(".config/usbip-console/console.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.console.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.console.log_level,
                valid_levels.join(", ")
            ));
        }

        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!(
                "Invalid backend base_url '{}', must start with http:// or https://",
                self.backend.base_url
            ));
        }

        if self.backend.timeout_secs == 0 {
            return Err(anyhow!("backend.timeout_secs must be greater than zero"));
        }
        if self.console.notification_ttl_ms == 0 {
            return Err(anyhow!("console.notification_ttl_ms must be greater than zero"));
        }
        if self.console.log_limit == 0 {
            return Err(anyhow!("console.log_limit must be greater than zero"));
        }

        for host in &self.remote_hosts {
            if host.address.trim().is_empty() {
                return Err(anyhow!("Remote host '{}' has an empty address", host.name));
            }
        }

        Ok(())
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
